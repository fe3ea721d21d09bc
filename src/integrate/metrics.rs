//! Quality metrics over the canonical table.

use std::collections::BTreeMap;

use crate::domain::{CanonicalBook, QualityMetrics, SourceDetailRecord, SourceName};
use crate::integrate::merge::BookGroup;

/// Percentage (two decimals) of `books` where `is_null` holds. `0.0` when empty.
pub fn pct_null(books: &[CanonicalBook], is_null: impl Fn(&CanonicalBook) -> bool) -> f64 {
    if books.is_empty() {
        return 0.0;
    }
    let nulls = books.iter().filter(|b| is_null(b)).count();
    round2(100.0 * nulls as f64 / books.len() as f64)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub fn compute_quality(
    books: &[CanonicalBook],
    details: &[SourceDetailRecord],
    groups: &[BookGroup],
    rows_consumed: &BTreeMap<SourceName, usize>,
) -> QualityMetrics {
    let mut rows_per_source = BTreeMap::new();
    let mut books_per_source = BTreeMap::new();
    for source in SourceName::ALL {
        let name = source.as_str().to_string();
        rows_per_source.insert(name.clone(), rows_consumed.get(&source).copied().unwrap_or(0));
        books_per_source.insert(name, details.iter().filter(|d| d.source_name == source).count());
    }

    QualityMetrics {
        total_dim_book: books.len(),
        pct_null_title: pct_null(books, |b| b.title.is_none()),
        pct_null_isbn13: pct_null(books, |b| b.isbn13.is_none()),
        pct_null_price: pct_null(books, |b| b.price.is_none()),
        rows_per_source,
        books_per_source,
        duplicates_found: groups.iter().filter(|g| g.is_duplicate()).count(),
    }
}
