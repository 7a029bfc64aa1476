use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use pricewatch_core::StrategyRef;
use thiserror::Error;

/// Errors reported by a [`crate::PageHandle`] or [`crate::BrowserSession`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("no visible element matches `{locator}`")]
    NotFound { locator: String },

    #[error("invalid locator `{locator}`: {reason}")]
    InvalidLocator { locator: String, reason: String },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("no page has been loaded")]
    NoPage,

    #[error("diagnostic capture to {path} failed: {reason}")]
    Capture { path: String, reason: String },

    #[error("browser session error: {0}")]
    Session(String),
}

/// Why a single strategy in a chain did not produce text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyFailureKind {
    Timeout,
    NotFound,
    EmptyText,
    Page,
}

impl fmt::Display for StrategyFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyFailureKind::Timeout => write!(f, "timeout"),
            StrategyFailureKind::NotFound => write!(f, "not found"),
            StrategyFailureKind::EmptyText => write!(f, "empty text"),
            StrategyFailureKind::Page => write!(f, "page error"),
        }
    }
}

/// A non-terminal failure of one strategy; the chain moves on to the next.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{strategy}: {kind} ({detail})")]
pub struct StrategyFailure {
    pub strategy: StrategyRef,
    pub kind: StrategyFailureKind,
    pub detail: String,
}

impl StrategyFailure {
    pub(crate) fn from_page_error(strategy: StrategyRef, err: &PageError) -> Self {
        let kind = match err {
            PageError::Timeout(_) => StrategyFailureKind::Timeout,
            PageError::NotFound { .. } => StrategyFailureKind::NotFound,
            _ => StrategyFailureKind::Page,
        };
        Self {
            strategy,
            kind,
            detail: err.to_string(),
        }
    }
}

/// Every strategy in a chain failed. Holds one failure per strategy, in
/// chain order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct NoStrategySucceeded {
    pub failures: Vec<StrategyFailure>,
}

impl fmt::Display for NoStrategySucceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failures.is_empty() {
            return write!(f, "no strategies configured");
        }
        write!(f, "all {} strategies failed: ", self.failures.len())?;
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizationError {
    #[error("no digits in {raw:?}")]
    NoDigits { raw: String },

    #[error("more than one decimal separator in {raw:?}")]
    MultipleDecimalSeparators { raw: String },

    #[error("negative price in {raw:?}")]
    Negative { raw: String },

    #[error("price {raw:?} is not representable: {reason}")]
    Unrepresentable { raw: String, reason: String },
}

impl NormalizationError {
    /// The text that failed to normalize.
    #[must_use]
    pub fn raw(&self) -> &str {
        match self {
            NormalizationError::NoDigits { raw }
            | NormalizationError::MultipleDecimalSeparators { raw }
            | NormalizationError::Negative { raw }
            | NormalizationError::Unrepresentable { raw, .. } => raw,
        }
    }
}

/// Terminal failure of a site adapter run.
#[derive(Debug, Error)]
pub(crate) enum AdapterError {
    #[error(transparent)]
    Navigation(PageError),

    #[error("{source}")]
    NoStrategy {
        source: NoStrategySucceeded,
        diagnostic: Option<PathBuf>,
    },

    #[error(transparent)]
    Normalization(NormalizationError),

    #[error("unit divisor {divisor} cannot be applied to price {price}")]
    UnitPrice { price: String, divisor: String },
}

/// Errors from writing a report to an output sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error writing report: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
