//! Goodreads search harvesting.
//!
//! Pages through `https://www.goodreads.com/search?q=..&page=..`, parses each
//! result row, and visits the book's detail page for ISBNs.

use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::Url;
use reqwest::blocking::Client;
use tracing::{debug, info, warn};

use crate::data::html;
use crate::data::throttle::Throttle;
use crate::domain::{HarvestConfig, HarvestRecord};
use crate::error::AppError;
use crate::normalize::{collapse_whitespace, only_digits_x};

pub const SEARCH_URL: &str = "https://www.goodreads.com/search";
pub const SITE_ROOT: &str = "https://www.goodreads.com";
pub const SOURCE_LABEL: &str = "goodreads_search";

/// Identity string sent with every request (looks like a desktop Chrome).
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0.0.0 Safari/537.36";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

static RATING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([0-5]\.\d+)").expect("valid rating regex"));
static RATINGS_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\d,]+)\s+ratings?\b").expect("valid count regex"));
static JSONLD_ISBN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""isbn"\s*:\s*"([0-9Xx\-]+)""#).expect("valid json-ld regex"));
static TEXT_ISBN13_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)ISBN[\s\-]?(?:13)?\s*:?\s*(97[89](?:-?\d){10})\b").expect("valid isbn13 regex")
});
static TEXT_ISBN10_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)ISBN[\s\-]?(?:10)?\s*:?\s*((?:\d-?){9}[\dXx])\b").expect("valid isbn10 regex")
});

/// Something that can return the HTML body of a URL.
pub trait PageFetcher {
    fn fetch(&self, url: &str) -> Result<String, AppError>;
}

pub struct GoodreadsClient {
    client: Client,
}

impl GoodreadsClient {
    pub fn new() -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::source(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl PageFetcher for GoodreadsClient {
    fn fetch(&self, url: &str) -> Result<String, AppError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| AppError::source(format!("Request to {url} failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::source(format!(
                "Request to {url} failed with status {}.",
                resp.status()
            )));
        }

        resp.text()
            .map_err(|e| AppError::source(format!("Failed to read body of {url}: {e}")))
    }
}

/// Outcome of a harvest run, before it is written to landing.
#[derive(Debug, Clone, Default)]
pub struct HarvestRun {
    pub records: Vec<HarvestRecord>,
    pub pages_fetched: usize,
    pub rows_skipped: usize,
    /// URL of the first search page (recorded in the run metadata).
    pub url: String,
}

/// Build the search URL for a query and 1-based page number.
pub fn search_url(query: &str, page: usize) -> String {
    let page = page.to_string();
    match Url::parse_with_params(SEARCH_URL, &[("q", query), ("page", page.as_str())]) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{SEARCH_URL}?q={}&page={page}", query.replace(' ', "+")),
    }
}

/// Page through search results until `min_items` rows are collected, the
/// results run dry, or `max_pages` is hit.
///
/// `on_record` is called for every row as soon as it is complete.
pub fn harvest<F, C>(
    fetcher: &F,
    config: &HarvestConfig,
    throttle: &Throttle,
    mut on_record: C,
) -> Result<HarvestRun, AppError>
where
    F: PageFetcher,
    C: FnMut(&HarvestRecord),
{
    let mut run = HarvestRun {
        url: search_url(&config.query, 1),
        ..HarvestRun::default()
    };
    let mut seen: HashSet<String> = HashSet::new();

    'pages: for page in 1..=config.max_pages.max(1) {
        let url = search_url(&config.query, page);
        if page > 1 {
            throttle.pause();
        }

        let body = match fetcher.fetch(&url) {
            Ok(body) => body,
            // The first page is the reachability check for the whole source.
            Err(e) if page == 1 => return Err(e),
            Err(e) => {
                warn!(page, error = %e, "search page fetch failed; stopping pagination");
                break;
            }
        };
        run.pages_fetched += 1;

        let rows = parse_search_page(&body);
        if rows.is_empty() {
            info!(page, "search results exhausted");
            break;
        }

        let mut new_rows = 0usize;
        for row in rows {
            let mut record = match row {
                Ok(record) => record,
                Err(reason) => {
                    debug!(page, %reason, "skipping search row");
                    run.rows_skipped += 1;
                    continue;
                }
            };

            let seen_key = record
                .source_url
                .clone()
                .or_else(|| record.title.clone())
                .unwrap_or_default();
            if !seen.insert(seen_key) {
                continue;
            }
            new_rows += 1;

            if let Some(detail_url) = record.source_url.clone() {
                throttle.pause();
                match fetcher.fetch(&detail_url) {
                    Ok(detail) => {
                        let (isbn10, isbn13) = extract_isbns(&detail);
                        record.isbn10 = isbn10;
                        record.isbn13 = isbn13;
                    }
                    Err(e) => warn!(url = %detail_url, error = %e, "detail page fetch failed; ISBNs left empty"),
                }
            }

            on_record(&record);
            run.records.push(record);
            if run.records.len() >= config.min_items {
                break 'pages;
            }
        }

        if new_rows == 0 {
            info!(page, "search page repeated earlier results; stopping");
            break;
        }
    }

    Ok(run)
}

/// Parse every result row of a search page.
///
/// Rows without a title are returned as `Err` so the caller can count them.
pub fn parse_search_page(body: &str) -> Vec<Result<HarvestRecord, String>> {
    let Some(table) = html::slice_between_ci(body, r#"<table class="tableList"#, "</table>") else {
        return Vec::new();
    };

    html::tag_blocks_ci(table, "tr")
        .into_iter()
        .map(parse_search_row)
        .collect()
}

fn parse_search_row(row: &str) -> Result<HarvestRecord, String> {
    let title_el = html::find_by_class(row, "a", "bookTitle").ok_or("row has no bookTitle link")?;
    let title = collapse_whitespace(&title_el.text()).ok_or("row has an empty title")?;

    let author = html::find_by_class(row, "a", "authorName").and_then(|el| collapse_whitespace(&el.text()));
    let (rating, ratings_count) = html::text_from_class(row, "span", "minirating")
        .map(|text| parse_rating(&text))
        .unwrap_or((None, None));
    let source_url = title_el.attr("href").and_then(|href| absolute_url(&href));

    Ok(HarvestRecord {
        title: Some(title),
        author,
        rating,
        ratings_count,
        source_url,
        isbn10: None,
        isbn13: None,
    })
}

/// Parse "4.12 avg rating — 5,241 ratings" into `(4.12, 5241)`.
pub fn parse_rating(text: &str) -> (Option<f64>, Option<u64>) {
    let rating = RATING_RE
        .captures(text)
        .and_then(|c| c[1].parse::<f64>().ok());
    let count = RATINGS_COUNT_RE
        .captures(text)
        .and_then(|c| c[1].replace(',', "").parse::<u64>().ok());
    (rating, count)
}

/// Resolve a result href against the site root, dropping tracking query params.
pub fn absolute_url(href: &str) -> Option<String> {
    let href = collapse_whitespace(href)?;
    let without_query = href.split(['?', '#']).next().unwrap_or_default();
    if without_query.is_empty() {
        return None;
    }
    if without_query.starts_with('/') {
        Some(format!("{SITE_ROOT}{without_query}"))
    } else {
        Some(without_query.to_string())
    }
}

/// Find `(isbn10, isbn13)` on a book detail page.
///
/// JSON-LD metadata is tried first, then visible "ISBN ..." text.
pub fn extract_isbns(body: &str) -> (Option<String>, Option<String>) {
    let mut isbn10 = None;
    let mut isbn13 = None;

    for caps in JSONLD_ISBN_RE.captures_iter(body) {
        match only_digits_x(Some(&caps[1])) {
            Some(v) if v.len() == 13 && isbn13.is_none() => isbn13 = Some(v),
            Some(v) if v.len() == 10 && isbn10.is_none() => isbn10 = Some(v),
            _ => {}
        }
    }

    let text = html::strip_tags(body);
    if isbn13.is_none() {
        isbn13 = TEXT_ISBN13_RE
            .captures(&text)
            .and_then(|c| only_digits_x(Some(&c[1])));
    }
    if isbn10.is_none() {
        isbn10 = TEXT_ISBN10_RE
            .captures(&text)
            .and_then(|c| only_digits_x(Some(&c[1])));
    }

    (isbn10, isbn13)
}
