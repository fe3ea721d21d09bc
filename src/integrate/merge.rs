//! Linkage, survivorship and canonical id assignment.
//!
//! Rows are linked into clusters in two passes:
//!
//! 1. rows with an ISBN-13 cluster on it
//! 2. rows without one link on `normalized_title|primary_author`, joining an
//!    ISBN cluster that carries the same title key when there is one
//!
//! Each cluster is merged and given a `book_id`; clusters whose ids coincide
//! are then folded into one group and merged again.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::{CanonicalBook, SourceName};
use crate::integrate::records::SourceRecord;
use crate::normalize::{derive_book_id, join_list, union_ci, IdentityKey};

/// All rows that resolved to one canonical book, in survivorship order.
#[derive(Debug, Clone)]
pub struct BookGroup {
    pub book_id: String,
    pub members: Vec<SourceRecord>,
    pub merged: MergedFields,
}

impl BookGroup {
    pub fn is_duplicate(&self) -> bool {
        self.members.len() > 1
    }

    pub fn to_canonical(&self, now: DateTime<Utc>) -> CanonicalBook {
        let m = &self.merged;
        CanonicalBook {
            book_id: self.book_id.clone(),
            title: m.title.clone(),
            authors: join_list(&m.authors),
            publisher: m.publisher.clone(),
            publication_date: m.publication_date,
            language: m.language.clone(),
            isbn10: m.isbn10.clone(),
            isbn13: m.isbn13.clone(),
            categories: m.categories.clone(),
            price: m.price,
            currency: m.currency.clone(),
            winning_source: m.winning_source,
            last_updated: now,
        }
    }
}

/// Field values that survived the merge of a set of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedFields {
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub publisher: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub language: Option<String>,
    pub isbn10: Option<String>,
    pub isbn13: Option<String>,
    pub categories: Vec<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub winning_source: SourceName,
}

impl MergedFields {
    pub fn book_id(&self) -> String {
        derive_book_id(&IdentityKey {
            isbn13: self.isbn13.as_deref(),
            title: self.title.as_deref(),
            primary_author: self.authors.first().map(String::as_str),
            publisher: self.publisher.as_deref(),
            publication_date: self.publication_date,
        })
    }
}

/// Catalog rows first, then the more complete row, then file order.
pub fn sort_for_survivorship(members: &mut [SourceRecord]) {
    members.sort_by_key(|r| (!r.source.is_catalog(), Reverse(r.completeness()), r.source, r.row));
}

fn first<T>(members: &[SourceRecord], field: impl Fn(&SourceRecord) -> Option<T>) -> Option<T> {
    members.iter().find_map(field)
}

/// Merge rows already in survivorship order.
///
/// Scalars take the first non-null value, so the catalog wins title and price
/// whenever it has them. Price and currency travel together from the row that
/// supplied the price. Authors and categories are unioned case-insensitively.
pub fn survive(members: &[SourceRecord]) -> MergedFields {
    let title_from = members.iter().find(|r| r.title.is_some());
    let price_from = members.iter().find(|r| r.price.is_some());
    let winning_source = title_from
        .or_else(|| members.first())
        .map_or(SourceName::Goodreads, |r| r.source);

    let currency = match price_from {
        Some(r) => r.currency.clone(),
        None => first(members, |r| r.currency.clone()),
    };

    MergedFields {
        title: title_from.and_then(|r| r.title.clone()),
        authors: union_ci(members.iter().flat_map(|r| r.authors.iter().cloned())),
        publisher: first(members, |r| r.publisher.clone()),
        publication_date: first(members, |r| r.publication_date),
        language: first(members, |r| r.language.clone()),
        isbn10: first(members, |r| r.isbn10.clone()),
        isbn13: first(members, |r| r.isbn13.clone()),
        categories: union_ci(members.iter().flat_map(|r| r.categories.iter().cloned())),
        price: price_from.and_then(|r| r.price),
        currency,
        winning_source,
    }
}

/// Link rows into clusters of row indices (see module docs).
pub fn link_clusters(records: &[SourceRecord]) -> Vec<Vec<usize>> {
    let mut clusters: Vec<Vec<usize>> = Vec::new();
    let mut by_isbn: HashMap<&str, usize> = HashMap::new();
    let mut by_title: HashMap<String, usize> = HashMap::new();

    for (idx, record) in records.iter().enumerate() {
        let Some(isbn13) = record.isbn13.as_deref() else {
            continue;
        };
        let cluster = *by_isbn.entry(isbn13).or_insert_with(|| {
            clusters.push(Vec::new());
            clusters.len() - 1
        });
        clusters[cluster].push(idx);
        if let Some(key) = record.title_key() {
            by_title.entry(key).or_insert(cluster);
        }
    }

    for (idx, record) in records.iter().enumerate() {
        if record.isbn13.is_some() {
            continue;
        }
        match record.title_key() {
            Some(key) => {
                let cluster = *by_title.entry(key).or_insert_with(|| {
                    clusters.push(Vec::new());
                    clusters.len() - 1
                });
                clusters[cluster].push(idx);
            }
            None => clusters.push(vec![idx]),
        }
    }

    clusters
}

/// Build canonical groups, ordered by `book_id`.
pub fn build_groups(records: Vec<SourceRecord>) -> Vec<BookGroup> {
    let clusters = link_clusters(&records);
    let mut slots: Vec<Option<SourceRecord>> = records.into_iter().map(Some).collect();

    let mut by_id: BTreeMap<String, Vec<SourceRecord>> = BTreeMap::new();
    for cluster in clusters {
        let mut members: Vec<SourceRecord> = cluster.into_iter().filter_map(|i| slots[i].take()).collect();
        sort_for_survivorship(&mut members);
        let book_id = survive(&members).book_id();
        by_id.entry(book_id).or_default().extend(members);
    }

    by_id
        .into_iter()
        .map(|(book_id, mut members)| {
            sort_for_survivorship(&mut members);
            let merged = survive(&members);
            BookGroup {
                book_id,
                members,
                merged,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(source: SourceName, row: usize) -> SourceRecord {
        SourceRecord {
            source,
            row,
            title: None,
            subtitle: None,
            authors: Vec::new(),
            publisher: None,
            publication_date: None,
            language: None,
            categories: Vec::new(),
            isbn10: None,
            isbn13: None,
            rating: None,
            ratings_count: None,
            source_url: None,
            external_id: None,
            price: None,
            currency: None,
        }
    }

    fn titled(source: SourceName, n: usize, title: &str, author: &str) -> SourceRecord {
        SourceRecord {
            title: Some(title.to_string()),
            authors: vec![author.to_string()],
            ..row(source, n)
        }
    }

    #[test]
    fn equal_isbn13_collapses_to_one_book() {
        let mut a = titled(SourceName::Goodreads, 1, "Python", "Ann");
        a.isbn13 = Some("9780306406157".to_string());
        let mut b = titled(SourceName::Goodreads, 2, "Python (2nd)", "Ann");
        b.isbn13 = Some("9780306406157".to_string());

        let groups = build_groups(vec![a, b]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].book_id, "9780306406157");
        assert!(groups[0].is_duplicate());
    }

    #[test]
    fn catalog_title_and_price_win() {
        let mut scraped = titled(SourceName::Goodreads, 1, "Python Crash Course, 3rd", "Eric Matthes");
        scraped.isbn13 = Some("9781718502703".to_string());
        scraped.publisher = Some("Scraped Press".to_string());
        let mut catalog = titled(SourceName::GoogleBooks, 1, "Python Crash Course", "Eric Matthes");
        catalog.isbn13 = Some("9781718502703".to_string());
        catalog.price = Some(29.99);
        catalog.currency = Some("USD".to_string());

        let groups = build_groups(vec![catalog, scraped]);
        let merged = &groups[0].merged;
        assert_eq!(merged.title.as_deref(), Some("Python Crash Course"));
        assert_eq!(merged.winning_source, SourceName::GoogleBooks);
        assert_eq!(merged.price, Some(29.99));
        assert_eq!(merged.currency.as_deref(), Some("USD"));
        // The catalog has no publisher, so the scraped one survives.
        assert_eq!(merged.publisher.as_deref(), Some("Scraped Press"));
    }

    #[test]
    fn scraped_title_survives_when_catalog_has_none() {
        let mut catalog = row(SourceName::GoogleBooks, 1);
        catalog.isbn13 = Some("9780306406157".to_string());
        let mut scraped = titled(SourceName::Goodreads, 1, "Fallback", "Ann");
        scraped.isbn13 = Some("9780306406157".to_string());

        let merged = survive(&{
            let mut m = vec![scraped, catalog];
            sort_for_survivorship(&mut m);
            m
        });
        assert_eq!(merged.title.as_deref(), Some("Fallback"));
        assert_eq!(merged.winning_source, SourceName::Goodreads);
    }

    #[test]
    fn category_and_author_union() {
        let mut a = titled(SourceName::GoogleBooks, 1, "T", "Ann");
        a.categories = vec!["Fiction".to_string()];
        let mut b = titled(SourceName::Goodreads, 1, "T", "ann");
        b.authors.push("Bob".to_string());
        b.categories = vec!["fiction".to_string(), "Drama".to_string()];

        let merged = survive(&[a, b]);
        assert_eq!(merged.categories, vec!["Fiction".to_string(), "Drama".to_string()]);
        assert_eq!(merged.authors, vec!["Ann".to_string(), "Bob".to_string()]);
    }

    #[test]
    fn rows_without_isbn_link_by_title_key() {
        let mut catalog = titled(SourceName::GoogleBooks, 1, "Deep Learning", "Ian Goodfellow");
        catalog.isbn13 = Some("9780262035613".to_string());
        let scraped = titled(SourceName::Goodreads, 1, "Deep-Learning", "ian goodfellow");
        let loner = titled(SourceName::Goodreads, 2, "Something Else", "Someone");

        let groups = build_groups(vec![catalog, scraped, loner]);
        assert_eq!(groups.len(), 2);
        let deep = groups.iter().find(|g| g.book_id == "9780262035613").unwrap();
        assert_eq!(deep.members.len(), 2);
        let other = groups.iter().find(|g| g.book_id != "9780262035613").unwrap();
        assert_eq!(other.book_id.len(), 64);
        assert!(!other.is_duplicate());
    }

    #[test]
    fn equal_fallback_ids_collapse() {
        // Same normalized title and author, no ISBN anywhere: one hashed id.
        let a = titled(SourceName::Goodreads, 1, "Data Science: Basics", "Ann");
        let b = titled(SourceName::Goodreads, 2, "data science basics", "ANN");
        let groups = build_groups(vec![a.clone(), b.clone()]);
        assert_eq!(groups.len(), 1);

        let again = build_groups(vec![a, b]);
        assert_eq!(groups[0].book_id, again[0].book_id);
    }

    #[test]
    fn rows_without_any_key_stay_apart_unless_ids_match() {
        let mut a = row(SourceName::Goodreads, 1);
        a.publisher = Some("P1".to_string());
        let mut b = row(SourceName::Goodreads, 2);
        b.publisher = Some("P2".to_string());
        let groups = build_groups(vec![a, b]);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn groups_are_ordered_by_book_id() {
        let mut a = titled(SourceName::Goodreads, 1, "B", "x");
        a.isbn13 = Some("9790000000002".to_string());
        let mut b = titled(SourceName::Goodreads, 2, "A", "y");
        b.isbn13 = Some("9780000000002".to_string());
        let ids: Vec<String> = build_groups(vec![a, b]).into_iter().map(|g| g.book_id).collect();
        assert_eq!(ids, vec!["9780000000002".to_string(), "9790000000002".to_string()]);
    }
}
