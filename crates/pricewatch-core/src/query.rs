//! Extraction task descriptors: what to load, how to find the price on it,
//! and how to turn the price into a per-unit figure.

use std::fmt;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Serialize;

/// A typed locator handed to the page collaborator.
///
/// Renders to a Playwright-style selector string via `Display`, which is what
/// ends up in logs and failure messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// A plain CSS selector.
    Css(String),
    /// Elements matching `scope` whose visible text contains `text`.
    HasText { scope: String, text: String },
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(selector) => f.write_str(selector),
            Locator::HasText { scope, text } => {
                write!(f, "{scope}:has-text('{}')", escape_quoted(text))
            }
        }
    }
}

/// One way of locating the price element on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorStrategy {
    /// A site-specific CSS selector, e.g. `span[class*='sellingPriceValue']`.
    CssSelector { selector: String, timeout: Duration },
    /// Any element whose `attribute` starts with `prefix`. Used for React
    /// storefronts whose class names are generated but whose test ids are stable.
    AttributePrefixSelector {
        attribute: String,
        prefix: String,
        timeout: Duration,
    },
    /// Any visible `scope` element containing `text` (typically a currency
    /// symbol). Ambiguous; only ever the last resort in a chain.
    TextContainsFallback {
        scope: String,
        text: String,
        timeout: Duration,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Css,
    AttributePrefix,
    TextContains,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Css => write!(f, "css"),
            StrategyKind::AttributePrefix => write!(f, "attribute_prefix"),
            StrategyKind::TextContains => write!(f, "text_contains"),
        }
    }
}

impl SelectorStrategy {
    #[must_use]
    pub fn kind(&self) -> StrategyKind {
        match self {
            SelectorStrategy::CssSelector { .. } => StrategyKind::Css,
            SelectorStrategy::AttributePrefixSelector { .. } => StrategyKind::AttributePrefix,
            SelectorStrategy::TextContainsFallback { .. } => StrategyKind::TextContains,
        }
    }

    /// Maximum time to wait for this strategy's locator to become visible.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        match self {
            SelectorStrategy::CssSelector { timeout, .. }
            | SelectorStrategy::AttributePrefixSelector { timeout, .. }
            | SelectorStrategy::TextContainsFallback { timeout, .. } => *timeout,
        }
    }

    #[must_use]
    pub fn locator(&self) -> Locator {
        match self {
            SelectorStrategy::CssSelector { selector, .. } => Locator::Css(selector.clone()),
            SelectorStrategy::AttributePrefixSelector {
                attribute, prefix, ..
            } => Locator::Css(format!("[{attribute}^='{}']", escape_quoted(prefix))),
            SelectorStrategy::TextContainsFallback { scope, text, .. } => Locator::HasText {
                scope: scope.clone(),
                text: text.clone(),
            },
        }
    }
}

/// Identifies which strategy of a chain produced a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyRef {
    /// Zero-based position in the chain.
    pub index: usize,
    pub kind: StrategyKind,
    /// Rendered locator expression.
    pub locator: String,
}

impl StrategyRef {
    #[must_use]
    pub fn new(index: usize, strategy: &SelectorStrategy) -> Self {
        Self {
            index,
            kind: strategy.kind(),
            locator: strategy.locator().to_string(),
        }
    }
}

impl fmt::Display for StrategyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} `{}`", self.index, self.kind, self.locator)
    }
}

/// Immutable descriptor of one extraction task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceQuery {
    pub site_id: String,
    pub url: String,
    /// ISO 4217 code of the site's native currency.
    pub currency: String,
    /// Display label for the divisor's unit (e.g. `m`).
    pub unit_label: Option<String>,
    /// Tried in order; the first strategy yielding visible text wins.
    pub strategies: Vec<SelectorStrategy>,
    /// Physical quantity per package (e.g. 6.1 metres of pipe). Always positive.
    pub unit_divisor: Decimal,
    pub navigation_timeout: Duration,
}

/// Slack granted on top of each bounded step's own timeout before the
/// pipeline abandons it.
pub const STEP_GRACE: Duration = Duration::from_millis(250);

impl PriceQuery {
    /// Upper bound on how long one adapter run may take: navigation, every
    /// strategy (wait and read together), and one diagnostic capture, each
    /// plus [`STEP_GRACE`].
    #[must_use]
    pub fn time_budget(&self) -> Duration {
        let strategies: Duration = self
            .strategies
            .iter()
            .map(|s| s.timeout() + STEP_GRACE)
            .sum();
        (self.navigation_timeout + STEP_GRACE) * 2 + strategies
    }
}

fn escape_quoted(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}
