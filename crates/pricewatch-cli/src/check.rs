use std::path::Path;

use anyhow::Context;
use pricewatch_core::{PriceQuery, SitesFile, StrategyRef};

/// Validates the sites file at `path` and prints every strategy chain.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, or validated.
pub(crate) fn run_check_sites(path: &Path) -> anyhow::Result<()> {
    let sites = pricewatch_core::load_sites(path)
        .with_context(|| format!("failed to load sites from {}", path.display()))?;
    print!("{}", describe_sites(&sites));
    println!("{}: {} sites ok", path.display(), sites.sites.len());
    Ok(())
}

pub(crate) fn describe_sites(sites: &SitesFile) -> String {
    let mut out = String::new();
    for query in sites.queries() {
        out.push_str(&describe_query(&query));
    }
    out
}

fn describe_query(query: &PriceQuery) -> String {
    let per = query
        .unit_label
        .as_deref()
        .map_or_else(String::new, |l| format!(" {l}"));
    let mut out = format!(
        "{} {} [{}, divisor {}{per}, navigation {}ms]\n",
        query.site_id,
        query.url,
        query.currency,
        query.unit_divisor,
        query.navigation_timeout.as_millis()
    );
    for (index, strategy) in query.strategies.iter().enumerate() {
        out.push_str(&format!(
            "  {} wait {}ms\n",
            StrategyRef::new(index, strategy),
            strategy.timeout().as_millis()
        ));
    }
    out
}
