//! Terminal summaries for each stage.
//!
//! Formatting lives here so stage logic stays free of presentation and output
//! changes stay localized.

use std::path::Path;

use crate::data::goodreads::HarvestRun;
use crate::data::google_books::EnrichRun;
use crate::domain::{HarvestConfig, HarvestRecord, QualityMetrics};

/// One line per harvested row (used when not headless).
pub fn format_harvest_row(index: usize, record: &HarvestRecord) -> String {
    let rating = record.rating.map_or_else(|| "-".to_string(), |r| format!("{r:.2}"));
    format!(
        "{:>3}. {} | {} | rating {} | isbn13 {}",
        index,
        record.title.as_deref().unwrap_or("<untitled>"),
        record.author.as_deref().unwrap_or("<unknown author>"),
        rating,
        record.isbn13.as_deref().unwrap_or("-"),
    )
}

pub fn format_harvest_summary(run: &HarvestRun, config: &HarvestConfig, output: &Path) -> String {
    let mut out = String::new();
    out.push_str("=== harvest - Goodreads search ===\n");
    out.push_str(&format!("Query: \"{}\"\n", config.query));
    out.push_str(&format!(
        "Records: {} (target {}) | pages fetched: {} | rows skipped: {}\n",
        run.records.len(),
        config.min_items,
        run.pages_fetched,
        run.rows_skipped,
    ));
    let with_isbn = run.records.iter().filter(|r| r.isbn13.is_some() || r.isbn10.is_some()).count();
    out.push_str(&format!("With ISBN: {with_isbn}\n"));
    out.push_str(&format!("Wrote: {}", output.display()));
    out
}

pub fn format_enrich_summary(run: &EnrichRun, inputs: usize, authenticated: bool, output: &Path) -> String {
    let mut out = String::new();
    out.push_str("=== enrich - Google Books ===\n");
    out.push_str(&format!(
        "Inputs: {inputs} | matched: {} | missed: {} | no query: {}\n",
        run.records.len(),
        run.lookups_missed,
        run.skipped_no_query,
    ));
    out.push_str(&format!(
        "API key: {}\n",
        if authenticated { "yes" } else { "no (unauthenticated)" }
    ));
    out.push_str(&format!("Wrote: {}", output.display()));
    out
}

pub fn format_integrate_summary(metrics: &QualityMetrics, detail_rows: usize, standard_dir: &Path) -> String {
    let mut out = String::new();
    out.push_str("=== integrate - dim_book ===\n");
    out.push_str(&format!(
        "Books: {} | detail rows: {} | duplicates merged: {}\n",
        metrics.total_dim_book, detail_rows, metrics.duplicates_found,
    ));
    out.push_str("Rows read:");
    for (source, rows) in &metrics.rows_per_source {
        out.push_str(&format!(" {source}={rows}"));
    }
    out.push('\n');
    out.push_str(&format!(
        "Null %: title {:.2} | isbn13 {:.2} | price {:.2}\n",
        metrics.pct_null_title, metrics.pct_null_isbn13, metrics.pct_null_price,
    ));
    out.push_str(&format!("Wrote: {}", standard_dir.display()));
    out
}
