//! The `run` command: load sites, extract, and hand the report to a sink.
//!
//! Individual site failures are part of the report, not errors. Only a bad
//! configuration or an unwritable output aborts the command.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use pricewatch_core::{AppConfig, BatchReport, PriceQuery, SitesFile};
use pricewatch_scraper::{
    BrowserSession, JsonSink, Orchestrator, ReportSink, SinkError, StaticSession, TextSink,
};

use crate::OutputFormat;

pub(crate) struct RunArgs {
    pub(crate) sites_path: PathBuf,
    pub(crate) site_filter: Vec<String>,
    pub(crate) format: OutputFormat,
    pub(crate) output: Option<PathBuf>,
    pub(crate) allow_failures: bool,
}

/// # Errors
///
/// Returns an error if the sites file is invalid, a requested site id is
/// unknown, the page session cannot be opened, or the report cannot be
/// written.
pub(crate) async fn run_extraction(
    config: &AppConfig,
    args: &RunArgs,
) -> anyhow::Result<ExitCode> {
    let sites = pricewatch_core::load_sites(&args.sites_path)
        .with_context(|| format!("failed to load sites from {}", args.sites_path.display()))?;
    let queries = select_queries(&sites, &args.site_filter)?;

    let session =
        StaticSession::new(&config.user_agent).context("failed to start page session")?;
    let mut page = session.new_page().await.context("failed to open page")?;

    let report = Orchestrator::from_config(config)
        .run(&mut page, &queries)
        .await;

    if let Err(e) = session.close_page(page).await {
        tracing::warn!(error = %e, "failed to close page");
    }

    write_report(&report, args.format, args.output.as_deref())?;

    if should_fail(&report, args.allow_failures) {
        tracing::error!(sites = report.len(), "no site produced a price");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Queries for the requested site ids in file order, or every site when the
/// filter is empty. Ids match case-insensitively.
pub(crate) fn select_queries(
    sites: &SitesFile,
    filter: &[String],
) -> anyhow::Result<Vec<PriceQuery>> {
    let queries = sites.queries();
    if filter.is_empty() {
        return Ok(queries);
    }

    if let Some(unknown) = filter
        .iter()
        .find(|id| !queries.iter().any(|q| q.site_id.eq_ignore_ascii_case(id)))
    {
        anyhow::bail!("unknown site '{unknown}'");
    }

    Ok(queries
        .into_iter()
        .filter(|q| filter.iter().any(|id| q.site_id.eq_ignore_ascii_case(id)))
        .collect())
}

pub(crate) fn should_fail(report: &BatchReport, allow_failures: bool) -> bool {
    report.all_failed() && !allow_failures
}

fn write_report(
    report: &BatchReport,
    format: OutputFormat,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            render(BufWriter::new(file), report, format)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            tracing::info!(path = %path.display(), "report written");
        }
        None => render(std::io::stdout().lock(), report, format)
            .context("failed to write report to stdout")?,
    }
    Ok(())
}

pub(crate) fn render<W: Write>(
    out: W,
    report: &BatchReport,
    format: OutputFormat,
) -> Result<(), SinkError> {
    match format {
        OutputFormat::Text => TextSink::new(out).write_report(report),
        OutputFormat::Json => JsonSink::new(out).write_report(report),
    }
}
