use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::query::{PriceQuery, SelectorStrategy};
use crate::ConfigError;

/// One strategy entry as written in `sites.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyConfig {
    Css {
        selector: String,
        timeout_ms: u64,
    },
    AttributePrefix {
        attribute: String,
        prefix: String,
        timeout_ms: u64,
    },
    TextContains {
        scope: String,
        text: String,
        timeout_ms: u64,
    },
}

impl StrategyConfig {
    fn timeout_ms(&self) -> u64 {
        match self {
            StrategyConfig::Css { timeout_ms, .. }
            | StrategyConfig::AttributePrefix { timeout_ms, .. }
            | StrategyConfig::TextContains { timeout_ms, .. } => *timeout_ms,
        }
    }

    fn is_text_fallback(&self) -> bool {
        matches!(self, StrategyConfig::TextContains { .. })
    }

    fn fields(&self) -> Vec<(&'static str, &str)> {
        match self {
            StrategyConfig::Css { selector, .. } => vec![("selector", selector.as_str())],
            StrategyConfig::AttributePrefix {
                attribute, prefix, ..
            } => vec![("attribute", attribute.as_str()), ("prefix", prefix.as_str())],
            StrategyConfig::TextContains { scope, text, .. } => {
                vec![("scope", scope.as_str()), ("text", text.as_str())]
            }
        }
    }

    fn to_strategy(&self) -> SelectorStrategy {
        let timeout = Duration::from_millis(self.timeout_ms());
        match self {
            StrategyConfig::Css { selector, .. } => SelectorStrategy::CssSelector {
                selector: selector.trim().to_owned(),
                timeout,
            },
            StrategyConfig::AttributePrefix {
                attribute, prefix, ..
            } => SelectorStrategy::AttributePrefixSelector {
                attribute: attribute.trim().to_owned(),
                prefix: prefix.clone(),
                timeout,
            },
            StrategyConfig::TextContains { scope, text, .. } => {
                SelectorStrategy::TextContainsFallback {
                    scope: scope.trim().to_owned(),
                    text: text.clone(),
                    timeout,
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    pub id: String,
    pub url: String,
    pub currency: String,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub unit_divisor: Decimal,
    #[serde(default)]
    pub unit_label: Option<String>,
    pub navigation_timeout_ms: u64,
    pub strategies: Vec<StrategyConfig>,
}

impl SiteConfig {
    #[must_use]
    pub fn to_query(&self) -> PriceQuery {
        PriceQuery {
            site_id: self.id.clone(),
            url: self.url.clone(),
            currency: self.currency.to_uppercase(),
            unit_label: self.unit_label.clone().filter(|l| !l.trim().is_empty()),
            strategies: self.strategies.iter().map(StrategyConfig::to_strategy).collect(),
            unit_divisor: self.unit_divisor,
            navigation_timeout: Duration::from_millis(self.navigation_timeout_ms),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SitesFile {
    pub sites: Vec<SiteConfig>,
}

impl SitesFile {
    /// Queries for every configured site, in file order.
    #[must_use]
    pub fn queries(&self) -> Vec<PriceQuery> {
        self.sites.iter().map(SiteConfig::to_query).collect()
    }
}

/// Load and validate the sites configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_sites(path: &Path) -> Result<SitesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SitesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_sites(&content)
}

/// Parse and validate sites configuration from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_sites(content: &str) -> Result<SitesFile, ConfigError> {
    let sites_file: SitesFile = serde_yaml::from_str(content)?;
    validate_sites(&sites_file)?;
    Ok(sites_file)
}

fn validate_sites(sites_file: &SitesFile) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();

    for site in &sites_file.sites {
        if site.id.trim().is_empty() {
            return Err(ConfigError::Validation("site id must be non-empty".to_string()));
        }

        if !seen_ids.insert(site.id.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate site id: '{}'",
                site.id
            )));
        }

        validate_url(site)?;

        let currency = site.currency.trim();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::Validation(format!(
                "site '{}' has invalid currency '{}'; expected a 3-letter ISO code",
                site.id, site.currency
            )));
        }

        if site.unit_divisor <= Decimal::ZERO {
            return Err(ConfigError::Validation(format!(
                "site '{}' has non-positive unit_divisor {}",
                site.id, site.unit_divisor
            )));
        }

        if site.navigation_timeout_ms == 0 {
            return Err(ConfigError::Validation(format!(
                "site '{}' has zero navigation_timeout_ms",
                site.id
            )));
        }

        validate_strategies(site)?;
    }

    Ok(())
}

fn validate_url(site: &SiteConfig) -> Result<(), ConfigError> {
    let host = site
        .url
        .strip_prefix("https://")
        .or_else(|| site.url.strip_prefix("http://"))
        .and_then(|rest| rest.split('/').next())
        .unwrap_or_default();
    if host.is_empty() {
        return Err(ConfigError::Validation(format!(
            "site '{}' has invalid url '{}'; expected an absolute http(s) URL",
            site.id, site.url
        )));
    }
    Ok(())
}

fn validate_strategies(site: &SiteConfig) -> Result<(), ConfigError> {
    if site.strategies.is_empty() {
        return Err(ConfigError::Validation(format!(
            "site '{}' has no strategies",
            site.id
        )));
    }

    let mut fallback_seen = false;
    for (idx, strategy) in site.strategies.iter().enumerate() {
        if strategy.timeout_ms() == 0 {
            return Err(ConfigError::Validation(format!(
                "site '{}' strategy #{idx} has zero timeout_ms",
                site.id
            )));
        }

        for (name, value) in strategy.fields() {
            if value.is_empty() || (name != "text" && value.trim().is_empty()) {
                return Err(ConfigError::Validation(format!(
                    "site '{}' strategy #{idx} has empty {name}",
                    site.id
                )));
            }
        }

        // Text matching is ambiguous; it must never outrank a selector.
        if strategy.is_text_fallback() {
            fallback_seen = true;
        } else if fallback_seen {
            return Err(ConfigError::Validation(format!(
                "site '{}' strategy #{idx} follows a text_contains fallback; \
                 text_contains must come last",
                site.id
            )));
        }
    }

    Ok(())
}

/// Accepts `unit_divisor` as a YAML number (`6.1`) or string (`"6.1"`).
fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawNumber {
        Text(String),
        Float(f64),
    }

    let text = match RawNumber::deserialize(deserializer)? {
        RawNumber::Text(s) => s,
        RawNumber::Float(f) => f.to_string(),
    };
    Decimal::from_str(text.trim()).map_err(serde::de::Error::custom)
}

#[cfg(test)]
#[path = "sites_test.rs"]
mod tests;
