//! Per-site extraction outcomes and the ordered batch report handed to the
//! output sink.

use std::fmt;
use std::path::PathBuf;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::query::StrategyRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    NavigationError,
    NoStrategySucceeded,
    NormalizationError,
    /// The adapter itself broke (panicked) rather than reporting a failure.
    Internal,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::NavigationError => write!(f, "navigation error"),
            FailureReason::NoStrategySucceeded => write!(f, "no strategy succeeded"),
            FailureReason::NormalizationError => write!(f, "normalization error"),
            FailureReason::Internal => write!(f, "internal error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceSuccess {
    pub site_id: String,
    pub price: Decimal,
    /// `price / unit_divisor`, two decimals, banker's rounding.
    pub unit_price: Decimal,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_label: Option<String>,
    pub source_strategy: StrategyRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceFailure {
    pub site_id: String,
    pub reason: FailureReason,
    /// Human-readable detail, e.g. the per-strategy failures.
    pub message: String,
    /// Unparseable text, kept for review when normalization failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    /// Page snapshot captured at failure time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic_artifact: Option<PathBuf>,
}

impl PriceFailure {
    #[must_use]
    pub fn new(site_id: &str, reason: FailureReason, message: impl Into<String>) -> Self {
        Self {
            site_id: site_id.to_owned(),
            reason,
            message: message.into(),
            raw_text: None,
            diagnostic_artifact: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PriceResult {
    Success(PriceSuccess),
    Failure(PriceFailure),
}

impl PriceResult {
    #[must_use]
    pub fn site_id(&self) -> &str {
        match self {
            PriceResult::Success(s) => &s.site_id,
            PriceResult::Failure(f) => &f.site_id,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, PriceResult::Success(_))
    }

    #[must_use]
    pub fn as_failure(&self) -> Option<&PriceFailure> {
        match self {
            PriceResult::Failure(f) => Some(f),
            PriceResult::Success(_) => None,
        }
    }

    #[must_use]
    pub fn as_success(&self) -> Option<&PriceSuccess> {
        match self {
            PriceResult::Success(s) => Some(s),
            PriceResult::Failure(_) => None,
        }
    }
}

impl From<PriceFailure> for PriceResult {
    fn from(value: PriceFailure) -> Self {
        PriceResult::Failure(value)
    }
}

impl From<PriceSuccess> for PriceResult {
    fn from(value: PriceSuccess) -> Self {
        PriceResult::Success(value)
    }
}

/// Results of one orchestrator run, in query declaration order.
///
/// Append-only: results can be added but never replaced or removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    results: Vec<PriceResult>,
}

impl BatchReport {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            results: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, result: PriceResult) {
        self.results.push(result);
    }

    #[must_use]
    pub fn results(&self) -> &[PriceResult] {
        &self.results
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn successes(&self) -> impl Iterator<Item = &PriceSuccess> {
        self.results.iter().filter_map(PriceResult::as_success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &PriceFailure> {
        self.results.iter().filter_map(PriceResult::as_failure)
    }

    /// `true` when the batch is non-empty and nothing succeeded.
    #[must_use]
    pub fn all_failed(&self) -> bool {
        !self.results.is_empty() && self.successes().next().is_none()
    }
}
