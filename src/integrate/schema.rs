//! Static description of the standard tables, written to `docs/schema.md`.

pub const SCHEMA_MD: &str = r#"# Standard layer schema

Both tables are Parquet files under `standard/`, regenerated on every
`integrate` run.

## dim_book

One row per canonical book, ordered by `book_id`.

| column | type | nullable | description |
|---|---|---|---|
| book_id | Utf8 | no | Canonical id (see below) |
| title | Utf8 | yes | Survived title |
| authors | Utf8 | yes | Authors joined with `;` |
| publisher | Utf8 | yes | Publisher |
| publication_date | Date32 | yes | ISO-8601 date (`YYYY` -> `YYYY-01-01`, `YYYY-MM` -> `YYYY-MM-01`) |
| language | Utf8 | yes | BCP-47 tag (`en`, `en-US`, `zh-Hant-TW`) |
| isbn10 | Utf8 | yes | ISBN-10, digits and `X` only |
| isbn13 | Utf8 | yes | ISBN-13, digits only |
| categories | List<Utf8> | yes | De-duplicated categories |
| price | Float64 | yes | List price |
| currency | Utf8 | yes | ISO-4217 code |
| winning_source | Utf8 | no | Source that supplied the title (`googlebooks` or `goodreads`) |
| last_updated | Timestamp(s, UTC) | no | Time of the integrate run |

## book_source_detail

One row per contributing source per canonical book, ordered by `book_id`
then `source_name`.

| column | type | nullable | description |
|---|---|---|---|
| book_id | Utf8 | no | Canonical id the rows resolved to |
| source_name | Utf8 | no | `goodreads` or `googlebooks` |
| source_file | Utf8 | no | Landing file the rows came from |
| source_ids | List<Utf8> | yes | `<source>-<row>` ids of the contributing rows (1-based) |
| record_count | UInt32 | no | Number of contributing rows |
| title | Utf8 | yes | |
| subtitle | Utf8 | yes | Catalog only |
| authors | Utf8 | yes | Goodreads `author` and catalog `authors` fused, joined with `;` |
| publisher | Utf8 | yes | |
| publication_date | Date32 | yes | |
| language | Utf8 | yes | |
| categories | List<Utf8> | yes | |
| isbn10 | Utf8 | yes | |
| isbn13 | Utf8 | yes | |
| rating | Float64 | yes | Goodreads average rating |
| ratings_count | UInt64 | yes | Goodreads rating count |
| source_url | Utf8 | yes | Goodreads detail page |
| external_id | Utf8 | yes | Google Books volume id |
| price | Float64 | yes | |
| currency | Utf8 | yes | |
| ingested_at | Timestamp(s, UTC) | no | Time of the integrate run |

## Identifier rule

`book_id` is the ISBN-13 when one is present. A missing ISBN-13 is first
derived from a valid ISBN-10 (`978` prefix, recomputed check digit).
Otherwise `book_id` is the hex SHA-256 of

    normalized_title || primary_author || publisher || publication_date

with every part trimmed and lowercased and absent parts left empty.
`normalized_title` is the lowercased title with `:` and `-` replaced by spaces
and whitespace collapsed. Records with equal keys collapse into one book.

## Linkage and survivorship

1. Rows sharing an ISBN-13 are linked.
2. Rows without ISBN-13 are linked on `normalized_title|primary_author`, and
   join an ISBN group carrying the same title key.
3. Linked rows are merged; groups whose `book_id` coincides are merged again.

Within a group rows are ranked Google Books first, then by completeness
(non-null title, primary author, publisher, date, language, isbn13, price,
currency), then by row order. Each scalar takes the first non-null value in
that ranking, so the catalog wins title and price (with its currency) when it
has them. Authors and categories are the case-insensitive union in first-seen
order.

## Quality metrics

`docs/quality_metrics.json` reports `total_dim_book`, the null percentage of
`title`, `isbn13` and `price` (two decimals), `rows_per_source` (landing rows
read), `books_per_source` (detail rows) and `duplicates_found` (canonical books
built from more than one row).
"#;
