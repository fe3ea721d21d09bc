//! Landing artifacts: harvest JSON, enrichment CSV, and the CSV sidecar.
//!
//! Design goals:
//! - **Row-level validation** on read (skip bad CSV rows, but report them)
//! - **Tolerant JSON**: bare `NaN`/`Infinity` literals are read as `null`
//! - **Clear errors** with the offending path (exit code 2)

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{EnrichmentMeta, EnrichmentRecord, HarvestFile};
use crate::error::AppError;
use crate::normalize::{clean_text, join_list, split_list, to_decimal};

pub const CSV_DELIMITER: u8 = b',';
pub const CSV_ENCODING: &str = "UTF-8";

pub const ENRICHMENT_COLUMNS: [&str; 12] = [
    "external_id",
    "title",
    "subtitle",
    "authors",
    "publisher",
    "publication_date",
    "language",
    "categories",
    "isbn13",
    "isbn10",
    "price_amount",
    "price_currency",
];

/// Write the harvester's landing JSON (pretty-printed, UTF-8).
pub fn write_harvest_json(path: &Path, payload: &HarvestFile) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| AppError::io("create harvest JSON", path, e))?;
    serde_json::to_writer_pretty(file, payload).map_err(|e| AppError::io("write harvest JSON", path, e))
}

/// Read the harvester's landing JSON.
pub fn read_harvest_json(path: &Path) -> Result<HarvestFile, AppError> {
    if !path.exists() {
        return Err(AppError::io(
            "find harvest JSON",
            path,
            "file does not exist (run `harvest` first)",
        ));
    }
    let raw = std::fs::read_to_string(path).map_err(|e| AppError::io("read harvest JSON", path, e))?;
    let sanitized = sanitize_non_finite_literals(&raw);
    serde_json::from_str(&sanitized).map_err(|e| AppError::io("parse harvest JSON", path, e))
}

/// Replace bare `NaN`, `Infinity` and `-Infinity` tokens (outside strings) with `null`.
///
/// Dataframe tooling emits these for missing numbers; they are not valid JSON.
pub fn sanitize_non_finite_literals(raw: &str) -> Cow<'_, str> {
    if !raw.contains("NaN") && !raw.contains("Infinity") {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut rest = raw;

    while let Some(c) = rest.chars().next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            rest = &rest[c.len_utf8()..];
            continue;
        }

        if c == '"' {
            in_string = true;
            out.push(c);
            rest = &rest[1..];
            continue;
        }

        let token = ["-Infinity", "Infinity", "NaN"]
            .into_iter()
            .find(|t| rest.starts_with(t));
        let boundary_before = out.chars().last().is_none_or(|p| !p.is_ascii_alphanumeric());
        match token {
            Some(t) if boundary_before => {
                out.push_str("null");
                rest = &rest[t.len()..];
            }
            _ => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }

    Cow::Owned(out)
}

/// Write the enrichment CSV with a fixed header.
pub fn write_enrichment_csv(path: &Path, records: &[EnrichmentRecord]) -> Result<(), AppError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(CSV_DELIMITER)
        .from_path(path)
        .map_err(|e| AppError::io("create enrichment CSV", path, e))?;

    writer
        .write_record(ENRICHMENT_COLUMNS)
        .map_err(|e| AppError::io("write enrichment CSV header", path, e))?;

    for r in records {
        let row = [
            r.external_id.clone().unwrap_or_default(),
            r.title.clone().unwrap_or_default(),
            r.subtitle.clone().unwrap_or_default(),
            join_list(&r.authors).unwrap_or_default(),
            r.publisher.clone().unwrap_or_default(),
            r.publication_date.clone().unwrap_or_default(),
            r.language.clone().unwrap_or_default(),
            join_list(&r.categories).unwrap_or_default(),
            r.isbn13.clone().unwrap_or_default(),
            r.isbn10.clone().unwrap_or_default(),
            r.price_amount.map(|v| v.to_string()).unwrap_or_default(),
            r.price_currency.clone().unwrap_or_default(),
        ];
        writer
            .write_record(&row)
            .map_err(|e| AppError::io("write enrichment CSV row", path, e))?;
    }

    writer.flush().map_err(|e| AppError::io("flush enrichment CSV", path, e))
}

/// A row-level error encountered while reading the enrichment CSV.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Enrichment CSV contents plus what had to be skipped.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentIngest {
    pub records: Vec<EnrichmentRecord>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Read the enrichment CSV. Columns are located by header name, so extra or
/// reordered columns are fine; every cell is treated as optional text.
pub fn read_enrichment_csv(path: &Path) -> Result<EnrichmentIngest, AppError> {
    if !path.exists() {
        return Err(AppError::io(
            "find enrichment CSV",
            path,
            "file does not exist (run `enrich` first)",
        ));
    }

    let file = File::open(path).map_err(|e| AppError::io("open enrichment CSV", path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(CSV_DELIMITER)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::io("read enrichment CSV headers", path, e))?
        .clone();
    let header_map = build_header_map(&headers);

    let mut ingest = EnrichmentIngest::default();
    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header, and lines are 1-based.
        let line = idx + 2;
        ingest.rows_read += 1;

        match result {
            Ok(record) => ingest.records.push(parse_enrichment_row(&record, &header_map)),
            Err(e) => ingest.row_errors.push(RowError {
                line,
                message: format!("CSV parse error: {e}"),
            }),
        }
    }

    Ok(ingest)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports may prefix the first header with a BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    let name = name.to_ascii_lowercase();
    // Older enrichment files used the catalog's own column names.
    match name.as_str() {
        "gb_id" => "external_id".to_string(),
        "pub_date" => "publication_date".to_string(),
        _ => name,
    }
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    header_map.get(name).and_then(|&idx| record.get(idx))
}

fn parse_enrichment_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> EnrichmentRecord {
    let text = |name: &str| clean_text(get_optional(record, header_map, name));

    EnrichmentRecord {
        external_id: text("external_id"),
        title: text("title"),
        subtitle: text("subtitle"),
        authors: split_list(get_optional(record, header_map, "authors")),
        publisher: text("publisher"),
        publication_date: text("publication_date"),
        language: text("language"),
        categories: split_list(get_optional(record, header_map, "categories")),
        isbn13: text("isbn13"),
        isbn10: text("isbn10"),
        price_amount: to_decimal(get_optional(record, header_map, "price_amount")),
        price_currency: text("price_currency"),
    }
}

pub fn write_enrichment_meta(path: &Path, meta: &EnrichmentMeta) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| AppError::io("create enrichment metadata", path, e))?;
    serde_json::to_writer_pretty(file, meta).map_err(|e| AppError::io("write enrichment metadata", path, e))
}

#[cfg(test)]
pub fn read_enrichment_meta(path: &Path) -> Result<EnrichmentMeta, AppError> {
    let file = File::open(path).map_err(|e| AppError::io("open enrichment metadata", path, e))?;
    serde_json::from_reader(file).map_err(|e| AppError::io("parse enrichment metadata", path, e))
}
