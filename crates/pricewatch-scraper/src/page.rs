//! The narrow interface to the rendered-page collaborator.
//!
//! Browser lifecycle and network transport live behind these traits. The
//! extraction pipeline only ever holds a page through `&mut`, so one adapter
//! step at a time has access to it.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use pricewatch_core::{Locator, STEP_GRACE};

use crate::error::PageError;

#[async_trait]
pub trait PageHandle: Send {
    /// Load `url`, failing if it does not finish within `timeout`.
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<(), PageError>;

    /// Wait until the first element matching `locator` is visible.
    async fn wait_for_visible(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<(), PageError>;

    /// Visible text of the first match, with fragmented child text nodes
    /// joined in document order.
    async fn read_visible_text(&mut self, locator: &Locator) -> Result<String, PageError>;

    /// Persist a snapshot of the current page state to `path`.
    async fn capture_diagnostic(&mut self, path: &Path) -> Result<(), PageError>;

    /// File extension of artifacts written by [`Self::capture_diagnostic`].
    fn diagnostic_extension(&self) -> &'static str {
        "png"
    }
}

#[async_trait]
pub trait BrowserSession: Send + Sync {
    type Page: PageHandle;

    async fn new_page(&self) -> Result<Self::Page, PageError>;

    async fn close_page(&self, page: Self::Page) -> Result<(), PageError>;
}

/// Runs a collaborator call under a hard deadline of `limit` plus a small
/// grace period, so a page that ignores its timeout argument cannot stall
/// the pipeline.
pub(crate) async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, PageError>
where
    F: Future<Output = Result<T, PageError>>,
{
    match tokio::time::timeout(limit + STEP_GRACE, call).await {
        Ok(result) => result,
        Err(_) => Err(PageError::Timeout(limit)),
    }
}
