//! Run configuration for the three stages.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

pub const DEFAULT_QUERY: &str = "data science";
pub const DEFAULT_MIN_ITEMS: usize = 12;
pub const DEFAULT_MAX_PAGES: usize = 10;
pub const DEFAULT_ENRICH_PAUSE_MS: u64 = 400;

/// Harvester options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestConfig {
    pub query: String,
    pub min_items: usize,
    /// `false` echoes every harvested row to stdout while the run progresses.
    pub headless: bool,
    /// Hard stop on paging, even if `min_items` has not been reached.
    pub max_pages: usize,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            query: DEFAULT_QUERY.to_string(),
            min_items: DEFAULT_MIN_ITEMS,
            headless: true,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

/// Enricher options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichConfig {
    pub pause: Duration,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            pause: Duration::from_millis(DEFAULT_ENRICH_PAUSE_MS),
        }
    }
}

/// Directory layout of a project root.
///
/// ```text
/// <root>/landing/   raw per-source extracts
/// <root>/standard/  canonical Parquet tables
/// <root>/docs/      schema + quality metrics
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn landing(&self) -> PathBuf {
        self.root.join("landing")
    }

    pub fn standard(&self) -> PathBuf {
        self.root.join("standard")
    }

    pub fn docs(&self) -> PathBuf {
        self.root.join("docs")
    }

    pub fn harvest_json(&self) -> PathBuf {
        self.landing().join("goodreads_books.json")
    }

    pub fn enrichment_csv(&self) -> PathBuf {
        self.landing().join("googlebooks_books.csv")
    }

    pub fn enrichment_meta(&self) -> PathBuf {
        self.landing().join("googlebooks_meta.json")
    }

    pub fn dim_book(&self) -> PathBuf {
        self.standard().join("dim_book.parquet")
    }

    pub fn source_detail(&self) -> PathBuf {
        self.standard().join("book_source_detail.parquet")
    }

    pub fn schema_doc(&self) -> PathBuf {
        self.docs().join("schema.md")
    }

    pub fn quality_metrics(&self) -> PathBuf {
        self.docs().join("quality_metrics.json")
    }

    /// Create `landing/`, `standard/` and `docs/` if missing.
    pub fn ensure_dirs(&self) -> Result<(), AppError> {
        for dir in [self.landing(), self.standard(), self.docs()] {
            std::fs::create_dir_all(&dir).map_err(|e| AppError::io("create directory", &dir, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths_hang_off_root() {
        let layout = Layout::new("/tmp/books");
        assert_eq!(layout.harvest_json(), PathBuf::from("/tmp/books/landing/goodreads_books.json"));
        assert_eq!(layout.dim_book(), PathBuf::from("/tmp/books/standard/dim_book.parquet"));
        assert_eq!(layout.quality_metrics(), PathBuf::from("/tmp/books/docs/quality_metrics.json"));
    }

    #[test]
    fn ensure_dirs_creates_all_three() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = Layout::new(tmp.path());
        layout.ensure_dirs().unwrap();
        assert!(layout.landing().is_dir());
        assert!(layout.standard().is_dir());
        assert!(layout.docs().is_dir());
    }
}
