//! Ordered price-locating strategies, evaluated by one resolver loop.
//!
//! A broken selector only costs its own timeout: the loop records the
//! failure and moves on, and the site fails only when the whole chain does.

use pricewatch_core::{SelectorStrategy, StrategyRef};

use crate::error::{NoStrategySucceeded, StrategyFailure, StrategyFailureKind};
use crate::page::{bounded, PageHandle};

/// Text read by the winning strategy, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawExtraction {
    pub text: String,
    pub source: StrategyRef,
    /// Failures of the strategies tried before `source`, in chain order.
    pub recovered: Vec<StrategyFailure>,
}

/// Tries `strategies` in order against `page` and returns the first
/// non-empty visible text.
///
/// Each strategy waits for its locator to become visible, then reads the
/// joined text of the first match in document order. Both steps together
/// must finish within the strategy's timeout.
///
/// # Errors
///
/// Returns [`NoStrategySucceeded`] with one [`StrategyFailure`] per strategy,
/// in chain order, when none of them yields text.
pub async fn resolve<P>(
    page: &mut P,
    strategies: &[SelectorStrategy],
) -> Result<RawExtraction, NoStrategySucceeded>
where
    P: PageHandle + ?Sized,
{
    let mut failures = Vec::with_capacity(strategies.len());

    for (index, strategy) in strategies.iter().enumerate() {
        let source = StrategyRef::new(index, strategy);
        match attempt(page, strategy, &source).await {
            Ok(text) => {
                tracing::debug!(strategy = %source, text = %text, "strategy matched");
                return Ok(RawExtraction {
                    text,
                    source,
                    recovered: failures,
                });
            }
            Err(failure) => {
                tracing::warn!(
                    strategy = %failure.strategy,
                    kind = %failure.kind,
                    detail = %failure.detail,
                    "strategy failed; trying next"
                );
                failures.push(failure);
            }
        }
    }

    Err(NoStrategySucceeded { failures })
}

async fn attempt<P>(
    page: &mut P,
    strategy: &SelectorStrategy,
    source: &StrategyRef,
) -> Result<String, StrategyFailure>
where
    P: PageHandle + ?Sized,
{
    let locator = strategy.locator();
    let timeout = strategy.timeout();

    // Wait and read share one deadline.
    let text = bounded(timeout, async {
        page.wait_for_visible(&locator, timeout).await?;
        page.read_visible_text(&locator).await
    })
    .await
    .map_err(|e| StrategyFailure::from_page_error(source.clone(), &e))?;

    let text = text.trim();
    if text.is_empty() {
        return Err(StrategyFailure {
            strategy: source.clone(),
            kind: StrategyFailureKind::EmptyText,
            detail: format!("`{locator}` matched but has no visible text"),
        });
    }

    Ok(text.to_owned())
}
