//! Per-site extraction: navigate, resolve the strategy chain, normalize,
//! and derive the unit price.
//!
//! A run moves strictly forward through
//! `Pending → Navigating → Resolving → Normalizing → Done` and is discarded
//! afterwards. The adapter never retries; that is the orchestrator's call.

use std::path::{Path, PathBuf};

use pricewatch_core::{FailureReason, PriceFailure, PriceQuery, PriceResult, PriceSuccess};

use crate::error::AdapterError;
use crate::normalize::{normalize, unit_price};
use crate::page::{bounded, PageHandle};
use crate::strategy::resolve;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    Pending,
    Navigating,
    Resolving,
    Normalizing,
    Done,
}

/// Binds one [`PriceQuery`] to the extraction state machine.
pub struct SiteAdapter<'a> {
    query: &'a PriceQuery,
    diagnostics_dir: &'a Path,
}

impl<'a> SiteAdapter<'a> {
    #[must_use]
    pub fn new(query: &'a PriceQuery, diagnostics_dir: &'a Path) -> Self {
        Self {
            query,
            diagnostics_dir,
        }
    }

    /// Runs the extraction against `page`.
    ///
    /// Side effects on the page: one navigation, the strategy chain's
    /// wait/read calls, and at most one diagnostic capture (only when the
    /// whole chain fails).
    pub async fn extract<P>(&self, page: &mut P) -> PriceResult
    where
        P: PageHandle + ?Sized,
    {
        let mut stage = Stage::Pending;
        let outcome = self.run(page, &mut stage).await;
        self.advance(&mut stage, Stage::Done);

        match outcome {
            Ok(success) => {
                tracing::info!(
                    site_id = %self.query.site_id,
                    price = %success.price,
                    unit_price = %success.unit_price,
                    strategy = %success.source_strategy,
                    "price extracted"
                );
                PriceResult::Success(success)
            }
            Err(err) => {
                let failure = self.failure_from(err);
                tracing::warn!(
                    site_id = %self.query.site_id,
                    reason = %failure.reason,
                    message = %failure.message,
                    diagnostic = ?failure.diagnostic_artifact,
                    "price extraction failed"
                );
                PriceResult::Failure(failure)
            }
        }
    }

    async fn run<P>(&self, page: &mut P, stage: &mut Stage) -> Result<PriceSuccess, AdapterError>
    where
        P: PageHandle + ?Sized,
    {
        let query = self.query;

        self.advance(stage, Stage::Navigating);
        bounded(
            query.navigation_timeout,
            page.goto(&query.url, query.navigation_timeout),
        )
        .await
        .map_err(AdapterError::Navigation)?;

        self.advance(stage, Stage::Resolving);
        let raw = match resolve(page, &query.strategies).await {
            Ok(raw) => raw,
            Err(source) => {
                let diagnostic = self.capture(page).await;
                return Err(AdapterError::NoStrategy { source, diagnostic });
            }
        };
        if !raw.recovered.is_empty() {
            tracing::debug!(
                site_id = %query.site_id,
                recovered = raw.recovered.len(),
                strategy = %raw.source,
                "price found by fallback strategy"
            );
        }

        self.advance(stage, Stage::Normalizing);
        let price = normalize(&raw.text).map_err(AdapterError::Normalization)?;
        let unit = unit_price(price, query.unit_divisor).ok_or_else(|| AdapterError::UnitPrice {
            price: price.to_string(),
            divisor: query.unit_divisor.to_string(),
        })?;

        Ok(PriceSuccess {
            site_id: query.site_id.clone(),
            price,
            unit_price: unit,
            currency: query.currency.clone(),
            unit_label: query.unit_label.clone(),
            source_strategy: raw.source,
        })
    }

    fn advance(&self, stage: &mut Stage, next: Stage) {
        debug_assert!(next > *stage, "adapter stage moved backwards: {stage:?} -> {next:?}");
        tracing::debug!(site_id = %self.query.site_id, from = ?*stage, to = ?next, "adapter transition");
        *stage = next;
    }

    /// Asks the page for a snapshot. Failure to capture is logged, not fatal.
    async fn capture<P>(&self, page: &mut P) -> Option<PathBuf>
    where
        P: PageHandle + ?Sized,
    {
        if let Err(e) = tokio::fs::create_dir_all(self.diagnostics_dir).await {
            tracing::warn!(
                site_id = %self.query.site_id,
                dir = %self.diagnostics_dir.display(),
                error = %e,
                "cannot create diagnostics directory; skipping capture"
            );
            return None;
        }

        let path = self.diagnostics_dir.join(diagnostic_file_name(
            &self.query.site_id,
            page.diagnostic_extension(),
        ));
        let limit = self.query.navigation_timeout;
        match bounded(limit, page.capture_diagnostic(&path)).await {
            Ok(()) => {
                tracing::info!(site_id = %self.query.site_id, path = %path.display(), "diagnostic captured");
                Some(path)
            }
            Err(e) => {
                tracing::warn!(site_id = %self.query.site_id, error = %e, "diagnostic capture failed");
                None
            }
        }
    }

    fn failure_from(&self, err: AdapterError) -> PriceFailure {
        let site_id = &self.query.site_id;
        match err {
            AdapterError::Navigation(e) => {
                PriceFailure::new(site_id, FailureReason::NavigationError, e.to_string())
            }
            AdapterError::NoStrategy { source, diagnostic } => PriceFailure {
                diagnostic_artifact: diagnostic,
                ..PriceFailure::new(site_id, FailureReason::NoStrategySucceeded, source.to_string())
            },
            AdapterError::Normalization(e) => PriceFailure {
                raw_text: Some(e.raw().to_owned()),
                ..PriceFailure::new(site_id, FailureReason::NormalizationError, e.to_string())
            },
            e @ AdapterError::UnitPrice { .. } => {
                PriceFailure::new(site_id, FailureReason::NormalizationError, e.to_string())
            }
        }
    }
}

/// `debug_<site>_<UTC timestamp>.<ext>`, with the site id reduced to
/// filename-safe characters.
fn diagnostic_file_name(site_id: &str, extension: &str) -> String {
    let safe: String = site_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%3fZ");
    format!("debug_{safe}_{stamp}.{extension}")
}
