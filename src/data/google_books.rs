//! Google Books API integration (volume search).

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::data::throttle::Throttle;
use crate::domain::{EnrichmentRecord, HarvestRecord};
use crate::error::AppError;
use crate::normalize::{clean_text, collapse_whitespace, only_digits_x, pick_best_isbn, union_ci};

const BASE_URL: &str = "https://www.googleapis.com/books/v1/volumes";
pub const API_KEY_VAR: &str = "GOOGLE_BOOKS_API_KEY";
pub const SOURCE_LABEL: &str = "google_books_api";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// A catalog that can answer a free-text volume query with its best hit.
///
/// `Ok(None)` is a per-record miss; `Err` means the catalog itself is unusable.
pub trait CatalogLookup {
    fn search(&self, query: &str) -> Result<Option<Volume>, AppError>;

    fn is_authenticated(&self) -> bool {
        false
    }
}

pub struct GoogleBooksClient {
    client: Client,
    api_key: Option<String>,
}

impl GoogleBooksClient {
    /// Build a client, reading the optional API key from the environment (`.env` honoured).
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let api_key = std::env::var(API_KEY_VAR).ok().and_then(|k| clean_text(Some(&k)));
        Self::new(api_key)
    }

    pub fn new(api_key: Option<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::source(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, api_key })
    }
}

impl CatalogLookup for GoogleBooksClient {
    fn search(&self, query: &str) -> Result<Option<Volume>, AppError> {
        let mut req = self.client.get(BASE_URL).query(&[
            ("q", query),
            ("maxResults", "1"),
            ("printType", "books"),
        ]);
        if let Some(key) = &self.api_key {
            req = req.query(&[("key", key.as_str())]);
        }

        let resp = match req.send() {
            Ok(resp) => resp,
            Err(e) if e.is_connect() => {
                return Err(AppError::source(format!("Google Books API unreachable: {e}")));
            }
            Err(e) => {
                warn!(%query, error = %e, "Google Books request failed; skipping record");
                return Ok(None);
            }
        };

        if !resp.status().is_success() {
            warn!(%query, status = %resp.status(), "Google Books returned an error status; skipping record");
            return Ok(None);
        }

        let body: VolumesResponse = match resp.json() {
            Ok(body) => body,
            Err(e) => {
                warn!(%query, error = %e, "failed to decode Google Books response; skipping record");
                return Ok(None);
            }
        };

        Ok(body.items.into_iter().next())
    }

    fn is_authenticated(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VolumesResponse {
    #[serde(default)]
    pub items: Vec<Volume>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub volume_info: VolumeInfo,
    #[serde(default)]
    pub sale_info: Option<SaleInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub industry_identifiers: Vec<IndustryIdentifier>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndustryIdentifier {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub identifier: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleInfo {
    #[serde(default)]
    pub list_price: Option<Price>,
    #[serde(default)]
    pub retail_price: Option<Price>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub currency_code: Option<String>,
}

/// The query sent for one harvested record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub q: String,
    /// Valid ISBN-13 the query was built from, if any.
    pub isbn13: Option<String>,
}

/// Prefer `isbn:`, then `intitle:+inauthor:`, then `intitle:`.
pub fn build_query(record: &HarvestRecord) -> Option<CatalogQuery> {
    let (isbn13, _) = pick_best_isbn(record.isbn13.as_deref(), record.isbn10.as_deref());
    if let Some(isbn13) = isbn13 {
        return Some(CatalogQuery {
            q: format!("isbn:{isbn13}"),
            isbn13: Some(isbn13),
        });
    }

    let title = record.title.as_deref().and_then(collapse_whitespace).map(|t| t.replace('"', ""));
    let author = record.author.as_deref().and_then(collapse_whitespace).map(|a| a.replace('"', ""));
    let q = match (title, author) {
        (Some(t), Some(a)) => format!("intitle:\"{t}\" inauthor:\"{a}\""),
        (Some(t), None) => format!("intitle:\"{t}\""),
        _ => return None,
    };
    Some(CatalogQuery { q, isbn13: None })
}

/// Flatten a catalog volume into an enrichment row.
///
/// The catalog's own ISBN-13 wins; the one used in the query is the fallback.
pub fn to_enrichment_record(volume: Volume, query_isbn13: Option<String>) -> EnrichmentRecord {
    let info = volume.volume_info;

    let mut isbn10 = None;
    let mut isbn13 = None;
    for ident in &info.industry_identifiers {
        match ident.kind.as_deref() {
            Some("ISBN_13") => isbn13 = only_digits_x(ident.identifier.as_deref()),
            Some("ISBN_10") => isbn10 = only_digits_x(ident.identifier.as_deref()),
            _ => {}
        }
    }

    // Amount and currency always come from the same price object.
    let sale = volume.sale_info.unwrap_or_default();
    let price = [sale.list_price, sale.retail_price]
        .into_iter()
        .flatten()
        .find(|p| p.amount.is_some_and(f64::is_finite))
        .unwrap_or_default();
    let price_amount = price.amount;
    let price_currency = price_amount.and(clean_text(price.currency_code.as_deref()));

    EnrichmentRecord {
        external_id: clean_text(volume.id.as_deref()),
        title: clean_text(info.title.as_deref()),
        subtitle: clean_text(info.subtitle.as_deref()),
        authors: union_ci(info.authors),
        publisher: clean_text(info.publisher.as_deref()),
        publication_date: clean_text(info.published_date.as_deref()),
        language: clean_text(info.language.as_deref()),
        categories: union_ci(info.categories),
        isbn13: isbn13.or(query_isbn13),
        isbn10,
        price_amount,
        price_currency,
    }
}

/// Result of looking up every harvested record.
#[derive(Debug, Clone, Default)]
pub struct EnrichRun {
    pub records: Vec<EnrichmentRecord>,
    pub lookups_missed: usize,
    pub skipped_no_query: usize,
}

/// Look each harvested record up in the catalog; zero or one row per input.
pub fn enrich<C: CatalogLookup>(
    catalog: &C,
    records: &[HarvestRecord],
    throttle: &Throttle,
) -> Result<EnrichRun, AppError> {
    let mut run = EnrichRun::default();

    for (idx, record) in records.iter().enumerate() {
        let Some(query) = build_query(record) else {
            debug!(row = idx + 1, "no ISBN or title to search by; skipping");
            run.skipped_no_query += 1;
            continue;
        };

        if idx > 0 {
            throttle.pause();
        }

        match catalog.search(&query.q)? {
            Some(volume) => run.records.push(to_enrichment_record(volume, query.isbn13)),
            None => {
                debug!(row = idx + 1, q = %query.q, "no catalog match");
                run.lookups_missed += 1;
            }
        }
    }

    Ok(run)
}
