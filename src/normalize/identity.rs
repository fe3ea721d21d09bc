//! Canonical identifiers.
//!
//! `book_id` is the ISBN-13 when there is one; otherwise a SHA-256 over the
//! normalized key fields. The hash is a pure function of its inputs so the same
//! book gets the same id on every run.

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

use crate::normalize::{clean_text, collapse_whitespace};

const KEY_SEPARATOR: &str = "||";

/// Lowercase, turn `:`/`-` into spaces, and collapse whitespace.
pub fn normalized_title(title: Option<&str>) -> Option<String> {
    let lowered = title?.to_lowercase().replace([':', '-'], " ");
    collapse_whitespace(&lowered)
}

fn key_part(value: Option<&str>) -> String {
    value
        .and_then(collapse_whitespace)
        .map(|v| v.to_lowercase())
        .unwrap_or_default()
}

/// SHA-256 (hex) over the parts joined with `||`. Absent parts hash as empty.
pub fn stable_id(parts: &[Option<&str>]) -> String {
    let base = parts.iter().map(|p| key_part(*p)).collect::<Vec<_>>().join(KEY_SEPARATOR);
    let mut hasher = Sha256::new();
    hasher.update(base.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Fields that make up the fallback identity of a book without ISBN-13.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityKey<'a> {
    pub isbn13: Option<&'a str>,
    pub title: Option<&'a str>,
    pub primary_author: Option<&'a str>,
    pub publisher: Option<&'a str>,
    pub publication_date: Option<NaiveDate>,
}

pub fn derive_book_id(key: &IdentityKey<'_>) -> String {
    if let Some(isbn13) = clean_text(key.isbn13) {
        return isbn13;
    }
    let title = normalized_title(key.title);
    let date = key.publication_date.map(|d| d.format("%Y-%m-%d").to_string());
    stable_id(&[
        title.as_deref(),
        key.primary_author,
        key.publisher,
        date.as_deref(),
    ])
}

/// Cross-source linkage key for records without ISBN-13: `title|author`.
///
/// Returns `None` without a title, since an author alone is not enough to link.
pub fn title_author_key(title: Option<&str>, primary_author: Option<&str>) -> Option<String> {
    let title = normalized_title(title)?;
    Some(format!("{title}|{}", key_part(primary_author)))
}
