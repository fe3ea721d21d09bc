//! Integration of the landing tables into the standard layer.
//!
//! Responsibilities:
//!
//! - normalize rows from both sources (`records`)
//! - link, merge and assign canonical ids (`merge`)
//! - build the per-source detail table (`detail`)
//! - compute quality metrics (`metrics`)
//!
//! Everything here is pure: the run timestamp is passed in, so the same inputs
//! always give the same tables.

pub mod detail;
pub mod merge;
pub mod metrics;
pub mod records;
pub mod schema;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::{CanonicalBook, EnrichmentRecord, HarvestRecord, QualityMetrics, SourceDetailRecord, SourceName};

pub use detail::build_source_detail;
pub use merge::{build_groups, BookGroup};
pub use metrics::compute_quality;
pub use records::{collect_source_records, SourceRecord};
pub use schema::SCHEMA_MD;

#[derive(Debug, Clone)]
pub struct IntegrationOutput {
    pub books: Vec<CanonicalBook>,
    pub details: Vec<SourceDetailRecord>,
    pub metrics: QualityMetrics,
}

pub fn integrate(
    harvest: &[HarvestRecord],
    enrichment: &[EnrichmentRecord],
    now: DateTime<Utc>,
) -> IntegrationOutput {
    let records = collect_source_records(harvest, enrichment);
    let groups = build_groups(records);
    debug!(groups = groups.len(), "linked source rows");

    let books: Vec<CanonicalBook> = groups.iter().map(|g| g.to_canonical(now)).collect();
    let details = build_source_detail(&groups, now);

    let consumed = BTreeMap::from([
        (SourceName::Goodreads, harvest.len()),
        (SourceName::GoogleBooks, enrichment.len()),
    ]);
    let metrics = compute_quality(&books, &details, &groups, &consumed);

    IntegrationOutput {
        books,
        details,
        metrics,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 8, 30, 0).unwrap()
    }

    #[test]
    fn end_to_end_duplicate_harvest_rows_and_catalog_hit() {
        let harvest = vec![
            HarvestRecord {
                title: Some("Data Science from Scratch".to_string()),
                author: Some("Joel Grus".to_string()),
                rating: Some(3.9),
                ratings_count: Some(1200),
                isbn13: Some("9781492041139".to_string()),
                ..HarvestRecord::default()
            },
            HarvestRecord {
                title: Some("Data Science From Scratch: First Principles".to_string()),
                author: Some("Joel Grus".to_string()),
                rating: Some(4.1),
                isbn13: Some("9781492041139".to_string()),
                ..HarvestRecord::default()
            },
        ];
        let enrichment = vec![EnrichmentRecord {
            external_id: Some("vol-1".to_string()),
            title: Some("Data Science from Scratch".to_string()),
            authors: vec!["Joel Grus".to_string()],
            publisher: Some("O'Reilly Media".to_string()),
            publication_date: Some("2019-04-12".to_string()),
            language: Some("en".to_string()),
            categories: vec!["Computers".to_string(), "Fiction".to_string()],
            isbn13: Some("9781492041139".to_string()),
            price_amount: Some(39.99),
            price_currency: Some("usd".to_string()),
            ..EnrichmentRecord::default()
        }];

        let out = integrate(&harvest, &enrichment, now());
        assert_eq!(out.books.len(), 1);
        let book = &out.books[0];
        assert_eq!(book.book_id, "9781492041139");
        assert_eq!(book.price, Some(39.99));
        assert_eq!(book.currency.as_deref(), Some("USD"));
        assert_eq!(book.categories, vec!["Computers".to_string(), "Fiction".to_string()]);
        assert_eq!(book.winning_source, SourceName::GoogleBooks);
        assert_eq!(book.last_updated, now());

        assert_eq!(out.metrics.total_dim_book, 1);
        assert_eq!(out.metrics.duplicates_found, 1);
        assert_eq!(out.metrics.pct_null_price, 0.0);
        assert_eq!(out.metrics.rows_per_source["goodreads"], 2);
        assert_eq!(out.metrics.rows_per_source["googlebooks"], 1);
        assert_eq!(out.details.len(), 2);
    }

    #[test]
    fn same_inputs_give_same_tables() {
        let harvest = vec![
            HarvestRecord {
                title: Some("Untitled Draft".to_string()),
                author: Some("A. Writer".to_string()),
                ..HarvestRecord::default()
            },
            HarvestRecord {
                title: Some("Another".to_string()),
                isbn10: Some("0306406152".to_string()),
                ..HarvestRecord::default()
            },
        ];
        let first = integrate(&harvest, &[], now());
        let second = integrate(&harvest, &[], now());
        assert_eq!(first.books, second.books);
        assert_eq!(first.details, second.details);
        assert_eq!(first.metrics, second.metrics);
        assert!(first.books.iter().any(|b| b.book_id == "9780306406157"));
    }

    #[test]
    fn empty_inputs_give_empty_tables() {
        let out = integrate(&[], &[], now());
        assert!(out.books.is_empty());
        assert!(out.details.is_empty());
        assert_eq!(out.metrics.pct_null_title, 0.0);
    }
}
