//! Batch runner: one adapter per query, sequentially, on a shared page.
//!
//! `run` never fails. Whatever happens inside an adapter, including a panic,
//! ends up as one [`PriceResult`] in the report, so a batch of N queries
//! always yields N results in query order.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::time::Duration;

use futures::FutureExt;
use pricewatch_core::{AppConfig, BatchReport, FailureReason, PriceFailure, PriceQuery, PriceResult};

use crate::adapter::SiteAdapter;
use crate::page::PageHandle;
use crate::retry::{backoff_delay, is_retriable};

#[derive(Debug, Clone)]
pub struct Orchestrator {
    diagnostics_dir: PathBuf,
    max_retries: u32,
    backoff_base: Duration,
}

impl Orchestrator {
    /// An orchestrator that writes diagnostics under `diagnostics_dir` and
    /// does not retry.
    #[must_use]
    pub fn new(diagnostics_dir: impl Into<PathBuf>) -> Self {
        Self {
            diagnostics_dir: diagnostics_dir.into(),
            max_retries: 0,
            backoff_base: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.diagnostics_dir.clone()).with_retries(
            config.max_retries,
            Duration::from_millis(config.retry_backoff_base_ms),
        )
    }

    /// Re-run a query whose navigation failed up to `max_retries` more
    /// times, sleeping `backoff_base * 2^attempt` in between.
    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, backoff_base: Duration) -> Self {
        self.max_retries = max_retries;
        self.backoff_base = backoff_base;
        self
    }

    /// Extracts every query in declaration order against `page`.
    pub async fn run<P>(&self, page: &mut P, queries: &[PriceQuery]) -> BatchReport
    where
        P: PageHandle + ?Sized,
    {
        tracing::info!(queries = queries.len(), "starting extraction batch");
        let mut report = BatchReport::with_capacity(queries.len());

        for query in queries {
            let result = self.run_query(page, query).await;
            report.push(result);
        }

        let succeeded = report.successes().count();
        tracing::info!(
            succeeded,
            failed = report.len() - succeeded,
            "extraction batch finished"
        );
        report
    }

    async fn run_query<P>(&self, page: &mut P, query: &PriceQuery) -> PriceResult
    where
        P: PageHandle + ?Sized,
    {
        tracing::debug!(
            site_id = %query.site_id,
            budget_ms = u64::try_from(query.time_budget().as_millis()).unwrap_or(u64::MAX),
            "extracting site"
        );
        let mut attempt = 0u32;
        loop {
            let result = self.attempt(page, query).await;
            if !is_retriable(&result) || attempt >= self.max_retries {
                return result;
            }

            let delay = backoff_delay(self.backoff_base, attempt);
            tracing::warn!(
                site_id = %query.site_id,
                attempt,
                max_retries = self.max_retries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "navigation failed; retrying after backoff"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// One adapter run, with any panic converted into a failure result.
    async fn attempt<P>(&self, page: &mut P, query: &PriceQuery) -> PriceResult
    where
        P: PageHandle + ?Sized,
    {
        let adapter = SiteAdapter::new(query, &self.diagnostics_dir);
        match AssertUnwindSafe(adapter.extract(page)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let message = format!("adapter panicked: {}", panic_message(&*panic));
                tracing::error!(site_id = %query.site_id, message = %message, "adapter crashed");
                PriceFailure::new(&query.site_id, FailureReason::Internal, message).into()
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "unknown panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_message_reads_str_and_string_payloads() {
        let s: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(&*s), "boom");
        let s: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(&*s), "bang");
        let s: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(&*s), "unknown panic payload");
    }

    #[test]
    fn from_config_carries_retry_policy() {
        let config = AppConfig {
            env: pricewatch_core::Environment::Test,
            log_level: "info".to_owned(),
            sites_path: PathBuf::from("sites.yaml"),
            diagnostics_dir: PathBuf::from("/tmp/diag"),
            user_agent: "ua".to_owned(),
            max_retries: 2,
            retry_backoff_base_ms: 750,
        };
        let orchestrator = Orchestrator::from_config(&config);
        assert_eq!(orchestrator.diagnostics_dir, PathBuf::from("/tmp/diag"));
        assert_eq!(orchestrator.max_retries, 2);
        assert_eq!(orchestrator.backoff_base, Duration::from_millis(750));
    }
}
