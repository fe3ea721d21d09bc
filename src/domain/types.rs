//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - written to / read from the landing artifacts (JSON, CSV)
//! - merged in-memory by the integrator
//! - exported to the standard Parquet tables

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::lenient;

/// Which upstream source a record came from.
///
/// Ordering matters: detail rows are emitted in this order per book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceName {
    Goodreads,
    #[serde(rename = "googlebooks")]
    GoogleBooks,
}

impl SourceName {
    pub const ALL: [SourceName; 2] = [SourceName::Goodreads, SourceName::GoogleBooks];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceName::Goodreads => "goodreads",
            SourceName::GoogleBooks => "googlebooks",
        }
    }

    /// Landing file this source is read from, relative to the project root.
    pub fn landing_file(self) -> &'static str {
        match self {
            SourceName::Goodreads => "landing/goodreads_books.json",
            SourceName::GoogleBooks => "landing/googlebooks_books.csv",
        }
    }

    /// The catalog source wins title/price survivorship.
    pub fn is_catalog(self) -> bool {
        matches!(self, SourceName::GoogleBooks)
    }
}

impl std::fmt::Display for SourceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One search result row as scraped by the harvester.
///
/// Every field is optional: a row missing some field is still kept. On read,
/// each field goes through a lenient deserializer so that `null`, `NaN`,
/// numbers, or `"nan"` strings never reach string handling as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HarvestRecord {
    #[serde(default, deserialize_with = "lenient::opt_free_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_free_text")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub ratings_count: Option<u64>,
    #[serde(default, alias = "book_url", deserialize_with = "lenient::opt_text")]
    pub source_url: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub isbn10: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub isbn13: Option<String>,
}

/// Run metadata stored next to the harvested records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HarvestMetadata {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub search_query: String,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub fetched_at_utc: String,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub headless: bool,
    #[serde(default)]
    pub pages_fetched: usize,
    #[serde(default)]
    pub rows_skipped: usize,
}

/// The harvester's landing artifact: metadata + records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HarvestFile {
    #[serde(default)]
    pub metadata: HarvestMetadata,
    #[serde(default)]
    pub records: Vec<HarvestRecord>,
}

/// One catalog hit produced by the enricher.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichmentRecord {
    pub external_id: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub authors: Vec<String>,
    pub publisher: Option<String>,
    pub publication_date: Option<String>,
    pub language: Option<String>,
    pub categories: Vec<String>,
    pub isbn13: Option<String>,
    pub isbn10: Option<String>,
    pub price_amount: Option<f64>,
    pub price_currency: Option<String>,
}

/// Sidecar describing how the enrichment CSV was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentMeta {
    pub separator: String,
    pub encoding: String,
    pub generated_at_utc: String,
    pub source: String,
    pub input_file: String,
    pub output_file: String,
    pub rows_written: usize,
    pub lookups_missed: usize,
    pub authenticated: bool,
}

/// A canonical `dim_book` row.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalBook {
    pub book_id: String,
    pub title: Option<String>,
    /// Authors flattened to one `;`-delimited string.
    pub authors: Option<String>,
    pub publisher: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub language: Option<String>,
    pub isbn10: Option<String>,
    pub isbn13: Option<String>,
    pub categories: Vec<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub winning_source: SourceName,
    pub last_updated: DateTime<Utc>,
}

/// A `book_source_detail` row: what one source said about one canonical book.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDetailRecord {
    pub book_id: String,
    pub source_name: SourceName,
    pub source_file: String,
    pub source_ids: Vec<String>,
    pub record_count: u32,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    /// Fused author field; replaces the per-source `author` / `authors` columns.
    pub authors: Option<String>,
    pub publisher: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub language: Option<String>,
    pub categories: Vec<String>,
    pub isbn10: Option<String>,
    pub isbn13: Option<String>,
    pub rating: Option<f64>,
    pub ratings_count: Option<u64>,
    pub source_url: Option<String>,
    pub external_id: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub ingested_at: DateTime<Utc>,
}

/// Data quality report written to `docs/quality_metrics.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub total_dim_book: usize,
    pub pct_null_title: f64,
    pub pct_null_isbn13: f64,
    pub pct_null_price: f64,
    /// Landing rows consumed per source.
    pub rows_per_source: BTreeMap<String, usize>,
    /// Canonical books each source contributed to (detail rows).
    pub books_per_source: BTreeMap<String, usize>,
    /// Canonical groups built from more than one record.
    pub duplicates_found: usize,
}
