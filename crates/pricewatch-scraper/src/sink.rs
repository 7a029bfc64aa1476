//! Output sinks that receive a finished [`BatchReport`].

use std::io::Write;

use pricewatch_core::{BatchReport, PriceResult};

use crate::error::SinkError;

pub trait ReportSink {
    /// # Errors
    ///
    /// Returns [`SinkError`] if the report cannot be written.
    fn write_report(&mut self, report: &BatchReport) -> Result<(), SinkError>;
}

/// One human-readable line per site.
pub struct TextSink<W: Write> {
    out: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportSink for TextSink<W> {
    fn write_report(&mut self, report: &BatchReport) -> Result<(), SinkError> {
        for result in report.results() {
            match result {
                PriceResult::Success(s) => {
                    let per = s
                        .unit_label
                        .as_deref()
                        .map_or_else(|| "/unit".to_owned(), |l| format!("/{l}"));
                    writeln!(
                        self.out,
                        "[OK]   {}: {} {} ({} {}{per}) via {}",
                        s.site_id, s.price, s.currency, s.unit_price, s.currency, s.source_strategy
                    )?;
                }
                PriceResult::Failure(f) => {
                    write!(self.out, "[FAIL] {}: {}: {}", f.site_id, f.reason, f.message)?;
                    if let Some(raw) = &f.raw_text {
                        write!(self.out, " (raw text: {raw:?})")?;
                    }
                    if let Some(path) = &f.diagnostic_artifact {
                        write!(self.out, " (diagnostic: {})", path.display())?;
                    }
                    writeln!(self.out)?;
                }
            }
        }
        let succeeded = report.successes().count();
        writeln!(self.out, "{succeeded}/{} sites extracted", report.len())?;
        self.out.flush()?;
        Ok(())
    }
}

/// Pretty-printed JSON document with a generation timestamp.
pub struct JsonSink<W: Write> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportSink for JsonSink<W> {
    fn write_report(&mut self, report: &BatchReport) -> Result<(), SinkError> {
        let succeeded = report.successes().count();
        let document = serde_json::json!({
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "succeeded": succeeded,
            "failed": report.len() - succeeded,
            "results": report.results(),
        });
        serde_json::to_writer_pretty(&mut self.out, &document)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}
