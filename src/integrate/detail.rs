//! `book_source_detail`: what each source said about each canonical book.

use chrono::{DateTime, Utc};

use crate::domain::{SourceDetailRecord, SourceName};
use crate::integrate::merge::BookGroup;
use crate::integrate::records::SourceRecord;
use crate::normalize::{join_list, union_ci};

/// One row per `(book_id, source)` pair, in `book_id` then source order.
pub fn build_source_detail(groups: &[BookGroup], now: DateTime<Utc>) -> Vec<SourceDetailRecord> {
    let mut out = Vec::new();
    for group in groups {
        for source in SourceName::ALL {
            let mut rows: Vec<&SourceRecord> = group.members.iter().filter(|r| r.source == source).collect();
            if rows.is_empty() {
                continue;
            }
            rows.sort_by_key(|r| r.row);
            out.push(detail_row(&group.book_id, source, &rows, now));
        }
    }
    out
}

fn detail_row(book_id: &str, source: SourceName, rows: &[&SourceRecord], now: DateTime<Utc>) -> SourceDetailRecord {
    fn first<T>(rows: &[&SourceRecord], field: impl Fn(&SourceRecord) -> Option<T>) -> Option<T> {
        rows.iter().find_map(|r| field(r))
    }

    // Goodreads' single `author` and the catalog's `authors` list land here as one field.
    let authors = union_ci(rows.iter().flat_map(|r| r.authors.iter().cloned()));
    let categories = union_ci(rows.iter().flat_map(|r| r.categories.iter().cloned()));

    SourceDetailRecord {
        book_id: book_id.to_string(),
        source_name: source,
        source_file: source.landing_file().to_string(),
        source_ids: rows.iter().map(|r| r.source_id()).collect(),
        record_count: u32::try_from(rows.len()).unwrap_or(u32::MAX),
        title: first(rows, |r| r.title.clone()),
        subtitle: first(rows, |r| r.subtitle.clone()),
        authors: join_list(&authors),
        publisher: first(rows, |r| r.publisher.clone()),
        publication_date: first(rows, |r| r.publication_date),
        language: first(rows, |r| r.language.clone()),
        categories,
        isbn10: first(rows, |r| r.isbn10.clone()),
        isbn13: first(rows, |r| r.isbn13.clone()),
        rating: first(rows, |r| r.rating),
        ratings_count: first(rows, |r| r.ratings_count),
        source_url: first(rows, |r| r.source_url.clone()),
        external_id: first(rows, |r| r.external_id.clone()),
        price: first(rows, |r| r.price),
        currency: first(rows, |r| r.currency.clone()),
        ingested_at: now,
    }
}
