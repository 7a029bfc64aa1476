//! Retry policy for the orchestrator.
//!
//! Only navigation failures are retried: a slow or flaky page load may
//! succeed on the next attempt, whereas a selector or parsing failure would
//! just fail again against the same markup.

use std::time::Duration;

use pricewatch_core::{FailureReason, PriceResult};

/// Returns `true` if `result` is a failure worth another attempt.
///
/// Retriable: [`FailureReason::NavigationError`].
///
/// Not retriable:
/// - [`FailureReason::NoStrategySucceeded`]: the selectors no longer match.
/// - [`FailureReason::NormalizationError`]: the text will not parse any better.
/// - [`FailureReason::Internal`]: the adapter itself is broken.
pub(crate) fn is_retriable(result: &PriceResult) -> bool {
    matches!(
        result.as_failure().map(|f| f.reason),
        Some(FailureReason::NavigationError)
    )
}

/// Delay before retry number `attempt + 1`: `base * 2^attempt`, saturating.
///
/// | Attempt | Sleep (base = 500 ms) |
/// |---------|-----------------------|
/// | 0 | 500 ms |
/// | 1 | 1 s |
/// | 2 | 2 s |
pub(crate) fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(1u32 << attempt.min(31))
}
