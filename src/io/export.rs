//! Export the canonical and per-source tables to Parquet.
//!
//! Columns are typed (dates as `Date32`, timestamps as `Timestamp(s, UTC)`,
//! categories as `List<Utf8>`) so the files can be queried without re-parsing.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow_array::builder::{ListBuilder, StringBuilder};
use arrow_array::{
    ArrayRef, Date32Array, Float64Array, ListArray, RecordBatch, StringArray, TimestampSecondArray, UInt32Array,
    UInt64Array,
};
use arrow_schema::{DataType, Field, Schema, TimeUnit};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use parquet::arrow::ArrowWriter;

use crate::domain::{CanonicalBook, SourceDetailRecord};
use crate::error::AppError;

const UTC: &str = "UTC";
/// `NaiveDate::num_days_from_ce()` of 1970-01-01.
const DAYS_CE_TO_UNIX_EPOCH: i32 = 719_163;

fn list_of_utf8() -> DataType {
    DataType::List(Arc::new(Field::new("item", DataType::Utf8, true)))
}

fn timestamp_utc() -> DataType {
    DataType::Timestamp(TimeUnit::Second, Some(UTC.into()))
}

pub fn dim_book_schema() -> Schema {
    Schema::new(vec![
        Field::new("book_id", DataType::Utf8, false),
        Field::new("title", DataType::Utf8, true),
        Field::new("authors", DataType::Utf8, true),
        Field::new("publisher", DataType::Utf8, true),
        Field::new("publication_date", DataType::Date32, true),
        Field::new("language", DataType::Utf8, true),
        Field::new("isbn10", DataType::Utf8, true),
        Field::new("isbn13", DataType::Utf8, true),
        Field::new("categories", list_of_utf8(), true),
        Field::new("price", DataType::Float64, true),
        Field::new("currency", DataType::Utf8, true),
        Field::new("winning_source", DataType::Utf8, false),
        Field::new("last_updated", timestamp_utc(), false),
    ])
}

pub fn source_detail_schema() -> Schema {
    Schema::new(vec![
        Field::new("book_id", DataType::Utf8, false),
        Field::new("source_name", DataType::Utf8, false),
        Field::new("source_file", DataType::Utf8, false),
        Field::new("source_ids", list_of_utf8(), true),
        Field::new("record_count", DataType::UInt32, false),
        Field::new("title", DataType::Utf8, true),
        Field::new("subtitle", DataType::Utf8, true),
        Field::new("authors", DataType::Utf8, true),
        Field::new("publisher", DataType::Utf8, true),
        Field::new("publication_date", DataType::Date32, true),
        Field::new("language", DataType::Utf8, true),
        Field::new("categories", list_of_utf8(), true),
        Field::new("isbn10", DataType::Utf8, true),
        Field::new("isbn13", DataType::Utf8, true),
        Field::new("rating", DataType::Float64, true),
        Field::new("ratings_count", DataType::UInt64, true),
        Field::new("source_url", DataType::Utf8, true),
        Field::new("external_id", DataType::Utf8, true),
        Field::new("price", DataType::Float64, true),
        Field::new("currency", DataType::Utf8, true),
        Field::new("ingested_at", timestamp_utc(), false),
    ])
}

/// Write `standard/dim_book.parquet`.
pub fn write_dim_book(path: &Path, books: &[CanonicalBook]) -> Result<(), AppError> {
    let columns: Vec<ArrayRef> = vec![
        utf8(books.iter().map(|b| Some(b.book_id.as_str()))),
        utf8(books.iter().map(|b| b.title.as_deref())),
        utf8(books.iter().map(|b| b.authors.as_deref())),
        utf8(books.iter().map(|b| b.publisher.as_deref())),
        dates(books.iter().map(|b| b.publication_date)),
        utf8(books.iter().map(|b| b.language.as_deref())),
        utf8(books.iter().map(|b| b.isbn10.as_deref())),
        utf8(books.iter().map(|b| b.isbn13.as_deref())),
        string_lists(books.iter().map(|b| b.categories.as_slice())),
        Arc::new(Float64Array::from(books.iter().map(|b| b.price).collect::<Vec<_>>())),
        utf8(books.iter().map(|b| b.currency.as_deref())),
        utf8(books.iter().map(|b| Some(b.winning_source.as_str()))),
        timestamps(books.iter().map(|b| b.last_updated)),
    ];

    let batch = RecordBatch::try_new(Arc::new(dim_book_schema()), columns)
        .map_err(|e| AppError::io("build dim_book batch for", path, e))?;
    write_parquet(path, &batch)
}

/// Write `standard/book_source_detail.parquet`.
pub fn write_source_detail(path: &Path, rows: &[SourceDetailRecord]) -> Result<(), AppError> {
    let columns: Vec<ArrayRef> = vec![
        utf8(rows.iter().map(|r| Some(r.book_id.as_str()))),
        utf8(rows.iter().map(|r| Some(r.source_name.as_str()))),
        utf8(rows.iter().map(|r| Some(r.source_file.as_str()))),
        string_lists(rows.iter().map(|r| r.source_ids.as_slice())),
        Arc::new(UInt32Array::from(rows.iter().map(|r| r.record_count).collect::<Vec<_>>())),
        utf8(rows.iter().map(|r| r.title.as_deref())),
        utf8(rows.iter().map(|r| r.subtitle.as_deref())),
        utf8(rows.iter().map(|r| r.authors.as_deref())),
        utf8(rows.iter().map(|r| r.publisher.as_deref())),
        dates(rows.iter().map(|r| r.publication_date)),
        utf8(rows.iter().map(|r| r.language.as_deref())),
        string_lists(rows.iter().map(|r| r.categories.as_slice())),
        utf8(rows.iter().map(|r| r.isbn10.as_deref())),
        utf8(rows.iter().map(|r| r.isbn13.as_deref())),
        Arc::new(Float64Array::from(rows.iter().map(|r| r.rating).collect::<Vec<_>>())),
        Arc::new(UInt64Array::from(rows.iter().map(|r| r.ratings_count).collect::<Vec<_>>())),
        utf8(rows.iter().map(|r| r.source_url.as_deref())),
        utf8(rows.iter().map(|r| r.external_id.as_deref())),
        Arc::new(Float64Array::from(rows.iter().map(|r| r.price).collect::<Vec<_>>())),
        utf8(rows.iter().map(|r| r.currency.as_deref())),
        timestamps(rows.iter().map(|r| r.ingested_at)),
    ];

    let batch = RecordBatch::try_new(Arc::new(source_detail_schema()), columns)
        .map_err(|e| AppError::io("build book_source_detail batch for", path, e))?;
    write_parquet(path, &batch)
}

fn write_parquet(path: &Path, batch: &RecordBatch) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| AppError::io("create Parquet file", path, e))?;
    let mut writer =
        ArrowWriter::try_new(file, batch.schema(), None).map_err(|e| AppError::io("open Parquet writer for", path, e))?;
    writer
        .write(batch)
        .map_err(|e| AppError::io("write record batch to", path, e))?;
    writer
        .close()
        .map_err(|e| AppError::io("close Parquet writer for", path, e))?;
    Ok(())
}

fn utf8<'a>(values: impl Iterator<Item = Option<&'a str>>) -> ArrayRef {
    Arc::new(StringArray::from(values.collect::<Vec<_>>()))
}

fn dates(values: impl Iterator<Item = Option<NaiveDate>>) -> ArrayRef {
    let days: Vec<Option<i32>> = values
        .map(|d| d.map(|d| d.num_days_from_ce() - DAYS_CE_TO_UNIX_EPOCH))
        .collect();
    Arc::new(Date32Array::from(days))
}

fn timestamps(values: impl Iterator<Item = DateTime<Utc>>) -> ArrayRef {
    let secs: Vec<i64> = values.map(|t| t.timestamp()).collect();
    Arc::new(TimestampSecondArray::from(secs).with_timezone(UTC))
}

fn string_lists<'a>(values: impl Iterator<Item = &'a [String]>) -> ArrayRef {
    let mut builder = ListBuilder::new(StringBuilder::new());
    for items in values {
        for item in items {
            builder.values().append_value(item);
        }
        builder.append(true);
    }
    let list: ListArray = builder.finish();
    Arc::new(list)
}
