//! Field-level normalization: text, dates, language tags, currencies, prices,
//! and `;`-delimited lists.
//!
//! Every function takes `Option<&str>` and returns `None` for absent or
//! invalid input. Nothing is ever defaulted.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

/// Separator for multi-valued fields stored in a single text column.
pub const LIST_SEPARATOR: char = ';';

static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}(-\d{2}){0,2}$").expect("valid date regex"));
static BCP47_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]{2,3}(-[A-Za-z0-9]{2,8})*$").expect("valid bcp47 regex"));
static CURRENCY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z]{3}$").expect("valid currency regex"));

/// Placeholder strings that mean "no value" in exported spreadsheets/dataframes.
const NULL_MARKERS: [&str; 4] = ["nan", "none", "null", "n/a"];

/// Trim and collapse inner whitespace; `None` when nothing is left.
///
/// For free text such as titles, where "None" or "Nan" can be a real value.
pub fn collapse_whitespace(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

/// Trim, collapse inner whitespace, and map empty strings / null markers to `None`.
pub fn clean_text(raw: Option<&str>) -> Option<String> {
    let collapsed = collapse_whitespace(raw?)?;
    if NULL_MARKERS.iter().any(|m| collapsed.eq_ignore_ascii_case(m)) {
        return None;
    }
    Some(collapsed)
}

/// Normalize a date to a calendar date.
///
/// - `YYYY`       -> `YYYY-01-01`
/// - `YYYY-MM`    -> `YYYY-MM-01`
/// - `YYYY-MM-DD` -> itself, if the day exists
///
/// A trailing time part (`2004-07-01T00:00:00`) is ignored.
pub fn norm_date_iso(raw: Option<&str>) -> Option<NaiveDate> {
    let s = clean_text(raw)?;
    let date_part = s.split('T').next().unwrap_or_default();
    if !ISO_DATE_RE.is_match(date_part) {
        return None;
    }

    let parts: Vec<u32> = date_part
        .split('-')
        .map(|p| p.parse::<u32>())
        .collect::<Result<_, _>>()
        .ok()?;

    let year = i32::try_from(parts[0]).ok()?;
    let month = parts.get(1).copied().unwrap_or(1);
    let day = parts.get(2).copied().unwrap_or(1);
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Validate a BCP-47 language tag and canonicalize its casing.
///
/// `en_us` -> `en-US`, `zh-hant-tw` -> `zh-Hant-TW`.
pub fn norm_lang_bcp47(raw: Option<&str>) -> Option<String> {
    let s = clean_text(raw)?.replace('_', "-");
    if !BCP47_RE.is_match(&s) {
        return None;
    }

    let mut out = Vec::new();
    for (idx, subtag) in s.split('-').enumerate() {
        let canonical = if idx == 0 {
            subtag.to_ascii_lowercase()
        } else if subtag.len() == 4 && subtag.chars().all(|c| c.is_ascii_alphabetic()) {
            let lower = subtag.to_ascii_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => lower,
            }
        } else if subtag.len() == 2 && subtag.chars().all(|c| c.is_ascii_alphabetic()) {
            subtag.to_ascii_uppercase()
        } else {
            subtag.to_ascii_lowercase()
        };
        out.push(canonical);
    }
    Some(out.join("-"))
}

/// Uppercase a currency code and require exactly three letters.
pub fn norm_currency_iso4217(raw: Option<&str>) -> Option<String> {
    let s = clean_text(raw)?.to_ascii_uppercase();
    CURRENCY_RE.is_match(&s).then_some(s)
}

/// Parse a price, accepting `,` as decimal separator. Non-finite values are rejected.
pub fn to_decimal(raw: Option<&str>) -> Option<f64> {
    let s = clean_text(raw)?;
    let parsed = s
        .parse::<f64>()
        .ok()
        .or_else(|| s.replace(',', ".").parse::<f64>().ok())?;
    parsed.is_finite().then_some(parsed)
}

/// Split a `;`-delimited text field into clean, non-empty items.
pub fn split_list(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    raw.split(LIST_SEPARATOR)
        .filter_map(|item| clean_text(Some(item)))
        .collect()
}

/// Case-insensitive, order-preserving union. The first spelling seen wins.
pub fn union_ci<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut out: Vec<String> = Vec::new();
    for item in items {
        let Some(item) = collapse_whitespace(&item) else {
            continue;
        };
        if !out.iter().any(|seen| seen.to_lowercase() == item.to_lowercase()) {
            out.push(item);
        }
    }
    out
}

/// Join a list back into a single `;`-delimited field (`None` when empty).
pub fn join_list(items: &[String]) -> Option<String> {
    if items.is_empty() {
        None
    } else {
        Some(items.join(&LIST_SEPARATOR.to_string()))
    }
}
