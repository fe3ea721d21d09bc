//! Stage workflows shared by the three binaries.
//!
//! Each stage has a `run_*` entry point that builds the real network clients
//! and a `run_*_with` variant taking the fetcher/catalog and timestamp, so the
//! whole workflow can run in tests against stubs and a temp directory.

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{info, warn};

use crate::data::goodreads::{self, GoodreadsClient, HarvestRun, PageFetcher, USER_AGENT};
use crate::data::google_books::{self, CatalogLookup, EnrichRun, GoogleBooksClient};
use crate::data::Throttle;
use crate::domain::{
    EnrichConfig, EnrichmentMeta, HarvestConfig, HarvestFile, HarvestMetadata, HarvestRecord, Layout, SourceName,
};
use crate::error::{AppError, EXIT_NO_DATA};
use crate::integrate::{IntegrationOutput, SCHEMA_MD};
use crate::io;

/// Outputs of an `enrich` run.
#[derive(Debug, Clone)]
pub struct EnrichOutput {
    pub run: EnrichRun,
    pub inputs: usize,
    pub meta: EnrichmentMeta,
}

/// Outputs of an `integrate` run.
#[derive(Debug, Clone)]
pub struct IntegrateOutput {
    pub integration: IntegrationOutput,
    /// Enrichment CSV rows that could not be parsed.
    pub rows_rejected: usize,
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn run_harvest<C>(config: &HarvestConfig, layout: &Layout, throttle: &Throttle, on_record: C) -> Result<HarvestRun, AppError>
where
    C: FnMut(&HarvestRecord),
{
    let client = GoodreadsClient::new()?;
    run_harvest_with(config, layout, &client, throttle, Utc::now(), on_record)
}

/// Harvest search results and write `landing/goodreads_books.json`.
///
/// A run that collects nothing fails with exit code 3 and leaves any previous
/// landing file in place.
pub fn run_harvest_with<F, C>(
    config: &HarvestConfig,
    layout: &Layout,
    fetcher: &F,
    throttle: &Throttle,
    fetched_at: DateTime<Utc>,
    on_record: C,
) -> Result<HarvestRun, AppError>
where
    F: PageFetcher,
    C: FnMut(&HarvestRecord),
{
    info!(query = %config.query, min_items = config.min_items, max_pages = config.max_pages, "harvesting");
    let run = goodreads::harvest(fetcher, config, throttle, on_record)?;
    if run.records.is_empty() {
        return Err(AppError::new(
            EXIT_NO_DATA,
            format!("No books found for query \"{}\" at {}.", config.query, run.url),
        ));
    }
    if run.records.len() < config.min_items {
        warn!(
            collected = run.records.len(),
            wanted = config.min_items,
            "search ran out before min_items was reached"
        );
    }

    layout.ensure_dirs()?;
    let payload = HarvestFile {
        metadata: HarvestMetadata {
            source: goodreads::SOURCE_LABEL.to_string(),
            search_query: config.query.clone(),
            user_agent: USER_AGENT.to_string(),
            fetched_at_utc: timestamp(fetched_at),
            total: run.records.len(),
            url: run.url.clone(),
            headless: config.headless,
            pages_fetched: run.pages_fetched,
            rows_skipped: run.rows_skipped,
        },
        records: run.records.clone(),
    };
    let path = layout.harvest_json();
    io::write_harvest_json(&path, &payload)?;
    info!(records = run.records.len(), path = %path.display(), "harvest written");
    Ok(run)
}

pub fn run_enrich(config: &EnrichConfig, layout: &Layout) -> Result<EnrichOutput, AppError> {
    let client = GoogleBooksClient::from_env()?;
    run_enrich_with(layout, &client, &Throttle::fixed(config.pause), Utc::now())
}

/// Look every harvested record up and write the enrichment CSV plus its sidecar.
pub fn run_enrich_with<C: CatalogLookup>(
    layout: &Layout,
    catalog: &C,
    throttle: &Throttle,
    generated_at: DateTime<Utc>,
) -> Result<EnrichOutput, AppError> {
    let harvest = io::read_harvest_json(&layout.harvest_json())?;
    let inputs = harvest.records.len();
    if inputs == 0 {
        return Err(AppError::new(
            EXIT_NO_DATA,
            format!("'{}' holds no records to enrich.", layout.harvest_json().display()),
        ));
    }

    info!(inputs, authenticated = catalog.is_authenticated(), "enriching");
    let run = google_books::enrich(catalog, &harvest.records, throttle)?;
    if run.records.is_empty() {
        warn!(inputs, "no catalog matches; writing an empty enrichment table");
    }

    layout.ensure_dirs()?;
    let csv_path = layout.enrichment_csv();
    io::write_enrichment_csv(&csv_path, &run.records)?;

    let meta = EnrichmentMeta {
        separator: char::from(io::CSV_DELIMITER).to_string(),
        encoding: io::CSV_ENCODING.to_string(),
        generated_at_utc: timestamp(generated_at),
        source: google_books::SOURCE_LABEL.to_string(),
        input_file: SourceName::Goodreads.landing_file().to_string(),
        output_file: SourceName::GoogleBooks.landing_file().to_string(),
        rows_written: run.records.len(),
        lookups_missed: run.lookups_missed,
        authenticated: catalog.is_authenticated(),
    };
    io::write_enrichment_meta(&layout.enrichment_meta(), &meta)?;
    info!(rows = run.records.len(), missed = run.lookups_missed, path = %csv_path.display(), "enrichment written");

    Ok(EnrichOutput { run, inputs, meta })
}

/// Merge both landing tables and write the standard tables and docs.
///
/// `now` stamps `last_updated`/`ingested_at`; with a fixed `now` the outputs
/// are byte-identical across runs.
pub fn run_integrate(layout: &Layout, now: DateTime<Utc>) -> Result<IntegrateOutput, AppError> {
    let harvest = io::read_harvest_json(&layout.harvest_json())?;
    let enrichment = io::read_enrichment_csv(&layout.enrichment_csv())?;
    for err in &enrichment.row_errors {
        warn!(line = err.line, message = %err.message, "skipping enrichment row");
    }
    if harvest.records.is_empty() && enrichment.records.is_empty() {
        return Err(AppError::new(EXIT_NO_DATA, "Both landing tables are empty; nothing to integrate."));
    }

    let integration = crate::integrate::integrate(&harvest.records, &enrichment.records, now);

    layout.ensure_dirs()?;
    io::write_dim_book(&layout.dim_book(), &integration.books)?;
    io::write_source_detail(&layout.source_detail(), &integration.details)?;
    io::write_schema_doc(&layout.schema_doc(), SCHEMA_MD)?;
    io::write_quality_metrics(&layout.quality_metrics(), &integration.metrics)?;
    info!(
        books = integration.metrics.total_dim_book,
        duplicates = integration.metrics.duplicates_found,
        "standard layer written"
    );

    Ok(IntegrateOutput {
        integration,
        rows_rejected: enrichment.row_errors.len(),
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use chrono::TimeZone;

    use super::*;
    use crate::data::google_books::Volume;
    use crate::domain::EnrichmentRecord;
    use crate::error::{EXIT_IO, EXIT_NO_DATA, EXIT_SOURCE};

    struct StubFetcher {
        pages: HashMap<String, String>,
    }

    impl PageFetcher for StubFetcher {
        fn fetch(&self, url: &str) -> Result<String, AppError> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| AppError::source(format!("unreachable: {url}")))
        }
    }

    struct StubCatalog {
        volume: Option<Volume>,
        queries: RefCell<Vec<String>>,
    }

    impl CatalogLookup for StubCatalog {
        fn search(&self, query: &str) -> Result<Option<Volume>, AppError> {
            self.queries.borrow_mut().push(query.to_string());
            Ok(self.volume.clone())
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 3, 4, 5, 6).unwrap()
    }

    fn search_page() -> String {
        r#"<html><table class="tableList">
            <tr><td><a class="bookTitle" href="/book/show/1.Dune?from_search=true"><span>Dune</span></a>
            <a class="authorName" href="/author/show/1"><span>Frank Herbert</span></a>
            <span class="minirating">4.27 avg rating &mdash; 1,400,000 ratings</span></td></tr>
        </table></html>"#
            .to_string()
    }

    fn harvest_record(title: &str, isbn13: Option<&str>) -> HarvestRecord {
        HarvestRecord {
            title: Some(title.to_string()),
            author: Some("Frank Herbert".to_string()),
            isbn13: isbn13.map(str::to_string),
            ..HarvestRecord::default()
        }
    }

    fn write_harvest(layout: &Layout, records: Vec<HarvestRecord>) {
        layout.ensure_dirs().unwrap();
        let payload = HarvestFile {
            metadata: HarvestMetadata::default(),
            records,
        };
        io::write_harvest_json(&layout.harvest_json(), &payload).unwrap();
    }

    #[test]
    fn harvest_writes_landing_json_with_metadata() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = Layout::new(tmp.path());
        let config = HarvestConfig {
            query: "dune".to_string(),
            min_items: 1,
            headless: false,
            max_pages: 3,
        };
        let fetcher = StubFetcher {
            pages: HashMap::from([
                (goodreads::search_url("dune", 1), search_page()),
                (
                    "https://www.goodreads.com/book/show/1.Dune".to_string(),
                    r#"<script type="application/ld+json">{"isbn":"9780441013593"}</script>"#.to_string(),
                ),
            ]),
        };

        let mut echoed = Vec::new();
        let run = run_harvest_with(&config, &layout, &fetcher, &Throttle::none(), at(), |r| {
            echoed.push(r.title.clone())
        })
        .unwrap();
        assert_eq!(run.records.len(), 1);
        assert_eq!(echoed, vec![Some("Dune".to_string())]);

        let file = io::read_harvest_json(&layout.harvest_json()).unwrap();
        assert_eq!(file.metadata.source, "goodreads_search");
        assert_eq!(file.metadata.fetched_at_utc, "2025-02-03T04:05:06Z");
        assert_eq!(file.metadata.total, 1);
        assert!(!file.metadata.headless);
        assert_eq!(file.records[0].isbn13.as_deref(), Some("9780441013593"));
    }

    #[test]
    fn unreachable_search_is_a_source_error() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = Layout::new(tmp.path());
        let fetcher = StubFetcher { pages: HashMap::new() };
        let err = run_harvest_with(&HarvestConfig::default(), &layout, &fetcher, &Throttle::none(), at(), |_| {})
            .unwrap_err();
        assert_eq!(err.exit_code(), EXIT_SOURCE);
        assert!(!layout.harvest_json().exists());
    }

    #[test]
    fn empty_harvest_keeps_previous_landing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = Layout::new(tmp.path());
        layout.ensure_dirs().unwrap();
        std::fs::write(layout.harvest_json(), "PREVIOUS").unwrap();

        let fetcher = StubFetcher {
            pages: HashMap::from([(
                goodreads::search_url("dune", 1),
                "<html><p>No results.</p></html>".to_string(),
            )]),
        };
        let config = HarvestConfig {
            query: "dune".to_string(),
            ..HarvestConfig::default()
        };
        let err = run_harvest_with(&config, &layout, &fetcher, &Throttle::none(), at(), |_| {}).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_NO_DATA);
        assert_eq!(std::fs::read_to_string(layout.harvest_json()).unwrap(), "PREVIOUS");
    }

    #[test]
    fn enrich_with_no_harvested_records_is_no_data() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = Layout::new(tmp.path());
        write_harvest(&layout, Vec::new());
        let catalog = StubCatalog {
            volume: None,
            queries: RefCell::new(Vec::new()),
        };
        let err = run_enrich_with(&layout, &catalog, &Throttle::none(), at()).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_NO_DATA);
        assert!(catalog.queries.borrow().is_empty());
        assert!(!layout.enrichment_csv().exists());
    }

    #[test]
    fn enrich_without_harvest_is_an_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = Layout::new(tmp.path());
        let catalog = StubCatalog {
            volume: None,
            queries: RefCell::new(Vec::new()),
        };
        let err = run_enrich_with(&layout, &catalog, &Throttle::none(), at()).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_IO);
    }

    #[test]
    fn enrich_writes_csv_and_sidecar() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = Layout::new(tmp.path());
        write_harvest(&layout, vec![harvest_record("Dune", Some("9780441013593")), HarvestRecord::default()]);

        let volume: Volume = serde_json::from_str(
            r#"{"id":"v1","volumeInfo":{"title":"Dune","authors":["Frank Herbert"]},
                "saleInfo":{"listPrice":{"amount":9.99,"currencyCode":"EUR"}}}"#,
        )
        .unwrap();
        let catalog = StubCatalog {
            volume: Some(volume),
            queries: RefCell::new(Vec::new()),
        };

        let out = run_enrich_with(&layout, &catalog, &Throttle::none(), at()).unwrap();
        assert_eq!(out.inputs, 2);
        assert_eq!(out.run.records.len(), 1);
        assert_eq!(out.run.skipped_no_query, 1);
        assert_eq!(catalog.queries.borrow().as_slice(), ["isbn:9780441013593"]);

        let meta = io::read_enrichment_meta(&layout.enrichment_meta()).unwrap();
        assert_eq!(meta.separator, ",");
        assert_eq!(meta.encoding, "UTF-8");
        assert_eq!(meta.rows_written, 1);
        assert!(!meta.authenticated);

        let csv = io::read_enrichment_csv(&layout.enrichment_csv()).unwrap();
        assert_eq!(csv.records[0].isbn13.as_deref(), Some("9780441013593"));
        assert_eq!(csv.records[0].price_currency.as_deref(), Some("EUR"));
    }

    fn seed_landing(layout: &Layout) {
        let mut first = harvest_record("Dune", Some("9780441013593"));
        first.rating = Some(4.2);
        let mut second = harvest_record("Dune", Some("9780441013593"));
        second.rating = Some(4.4);
        write_harvest(layout, vec![first, second, harvest_record("Children of Dune", None)]);

        let catalog_row = EnrichmentRecord {
            external_id: Some("v1".to_string()),
            title: Some("Dune".to_string()),
            authors: vec!["Frank Herbert".to_string()],
            categories: vec!["Fiction".to_string(), "Science Fiction".to_string()],
            isbn13: Some("9780441013593".to_string()),
            price_amount: Some(9.99),
            price_currency: Some("EUR".to_string()),
            ..EnrichmentRecord::default()
        };
        io::write_enrichment_csv(&layout.enrichment_csv(), &[catalog_row]).unwrap();
    }

    #[test]
    fn integrate_writes_standard_layer_and_docs() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = Layout::new(tmp.path());
        seed_landing(&layout);

        let out = run_integrate(&layout, at()).unwrap();
        let metrics = &out.integration.metrics;
        assert_eq!(metrics.total_dim_book, 2);
        assert_eq!(metrics.duplicates_found, 1);
        assert_eq!(metrics.pct_null_isbn13, 50.0);
        assert_eq!(out.rows_rejected, 0);

        let dune = out
            .integration
            .books
            .iter()
            .find(|b| b.book_id == "9780441013593")
            .unwrap();
        assert_eq!(dune.price, Some(9.99));
        assert_eq!(dune.categories.len(), 2);

        assert!(layout.dim_book().exists());
        assert!(layout.source_detail().exists());
        let schema = std::fs::read_to_string(layout.schema_doc()).unwrap();
        assert!(schema.contains("## dim_book"));
        assert_eq!(io::read_quality_metrics(&layout.quality_metrics()).unwrap(), *metrics);
    }

    #[test]
    fn integrate_is_idempotent_with_fixed_timestamp() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = Layout::new(tmp.path());
        seed_landing(&layout);

        run_integrate(&layout, at()).unwrap();
        let dim_first = std::fs::read(layout.dim_book()).unwrap();
        let detail_first = std::fs::read(layout.source_detail()).unwrap();
        let metrics_first = std::fs::read(layout.quality_metrics()).unwrap();

        run_integrate(&layout, at()).unwrap();
        assert_eq!(std::fs::read(layout.dim_book()).unwrap(), dim_first);
        assert_eq!(std::fs::read(layout.source_detail()).unwrap(), detail_first);
        assert_eq!(std::fs::read(layout.quality_metrics()).unwrap(), metrics_first);
    }

    #[test]
    fn integrate_with_empty_landing_is_no_data() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = Layout::new(tmp.path());
        write_harvest(&layout, Vec::new());
        io::write_enrichment_csv(&layout.enrichment_csv(), &[]).unwrap();

        let err = run_integrate(&layout, at()).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_NO_DATA);
        assert!(!layout.dim_book().exists());
    }

    #[test]
    fn integrate_counts_rejected_csv_rows() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = Layout::new(tmp.path());
        seed_landing(&layout);
        let mut csv = std::fs::read(layout.enrichment_csv()).unwrap();
        csv.extend_from_slice(b"v2,\xff\xfe\n");
        std::fs::write(layout.enrichment_csv(), csv).unwrap();

        let out = run_integrate(&layout, at()).unwrap();
        assert_eq!(out.rows_rejected, 1);
        assert_eq!(out.integration.metrics.total_dim_book, 2);
    }

    #[test]
    fn integrate_requires_both_landing_files() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = Layout::new(tmp.path());
        write_harvest(&layout, vec![harvest_record("Dune", None)]);
        let err = run_integrate(&layout, at()).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_IO);
        assert!(err.message().contains("googlebooks_books.csv"));
    }
}
