//! Source rows brought to one normalized shape before linkage.

use chrono::NaiveDate;

use crate::domain::{EnrichmentRecord, HarvestRecord, SourceName};
use crate::normalize::{
    clean_text, collapse_whitespace, norm_currency_iso4217, norm_date_iso, norm_lang_bcp47, resolve_isbns, split_list,
    title_author_key, union_ci,
};

/// One landing row after field normalization.
///
/// `row` is 1-based within its source file and is what `source_ids` refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    pub source: SourceName,
    pub row: usize,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub authors: Vec<String>,
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
}

impl SourceRecord {
    pub fn from_harvest(row: usize, record: &HarvestRecord) -> Self {
        let (isbn13, isbn10) = resolve_isbns(record.isbn13.as_deref(), record.isbn10.as_deref());
        Self {
            source: SourceName::Goodreads,
            row,
            title: record.title.as_deref().and_then(collapse_whitespace),
            subtitle: None,
            authors: union_ci(record.author.as_deref().and_then(collapse_whitespace)),
            publisher: None,
            publication_date: None,
            language: None,
            categories: Vec::new(),
            isbn10,
            isbn13,
            rating: record.rating.filter(|r| r.is_finite()),
            ratings_count: record.ratings_count,
            source_url: clean_text(record.source_url.as_deref()),
            external_id: None,
            price: None,
            currency: None,
        }
    }

    pub fn from_enrichment(row: usize, record: &EnrichmentRecord) -> Self {
        let (isbn13, isbn10) = resolve_isbns(record.isbn13.as_deref(), record.isbn10.as_deref());
        Self {
            source: SourceName::GoogleBooks,
            row,
            title: clean_text(record.title.as_deref()),
            subtitle: clean_text(record.subtitle.as_deref()),
            authors: union_ci(record.authors.iter().flat_map(|a| split_list(Some(a.as_str())))),
            publisher: clean_text(record.publisher.as_deref()),
            publication_date: norm_date_iso(record.publication_date.as_deref()),
            language: norm_lang_bcp47(record.language.as_deref()),
            categories: union_ci(record.categories.iter().flat_map(|c| split_list(Some(c.as_str())))),
            isbn10,
            isbn13,
            rating: None,
            ratings_count: None,
            source_url: None,
            external_id: clean_text(record.external_id.as_deref()),
            price: record.price_amount.filter(|p| p.is_finite()),
            currency: norm_currency_iso4217(record.price_currency.as_deref()),
        }
    }

    /// `<source>-<row>`, e.g. `goodreads-3`.
    pub fn source_id(&self) -> String {
        format!("{}-{}", self.source, self.row)
    }

    pub fn primary_author(&self) -> Option<&str> {
        self.authors.first().map(String::as_str)
    }

    pub fn title_key(&self) -> Option<String> {
        title_author_key(self.title.as_deref(), self.primary_author())
    }

    /// Number of filled key fields; the more complete record wins ties.
    pub fn completeness(&self) -> usize {
        [
            self.title.is_some(),
            self.primary_author().is_some(),
            self.publisher.is_some(),
            self.publication_date.is_some(),
            self.language.is_some(),
            self.isbn13.is_some(),
            self.price.is_some(),
            self.currency.is_some(),
        ]
        .into_iter()
        .filter(|filled| *filled)
        .count()
    }
}

/// Normalize both landing tables, catalog rows first, each in file order.
pub fn collect_source_records(harvest: &[HarvestRecord], enrichment: &[EnrichmentRecord]) -> Vec<SourceRecord> {
    let catalog = enrichment
        .iter()
        .enumerate()
        .map(|(i, r)| SourceRecord::from_enrichment(i + 1, r));
    let scraped = harvest
        .iter()
        .enumerate()
        .map(|(i, r)| SourceRecord::from_harvest(i + 1, r));
    catalog.chain(scraped).collect()
}
