//! Command-line parsing for the three ETL binaries.
//!
//! Argument parsing stays here, separate from the stage logic; `app` turns the
//! parsed args into domain config.

use std::path::PathBuf;

use clap::Parser;

use crate::domain::{DEFAULT_ENRICH_PAUSE_MS, DEFAULT_MAX_PAGES, DEFAULT_MIN_ITEMS, DEFAULT_QUERY};

/// Scrape Goodreads search results into `landing/goodreads_books.json`.
#[derive(Debug, Parser, Clone)]
#[command(name = "harvest", version, about = "Harvest book listings from Goodreads search")]
pub struct HarvestArgs {
    /// Search query.
    #[arg(short = 'q', long, default_value = DEFAULT_QUERY)]
    pub query: String,

    /// Stop once this many rows are collected.
    #[arg(short = 'n', long, default_value_t = DEFAULT_MIN_ITEMS)]
    pub min_items: usize,

    /// Run without per-row console output (enabled by default).
    #[arg(long, default_value_t = true)]
    pub headless: bool,

    /// Echo each harvested row to stdout.
    #[arg(long)]
    pub no_headless: bool,

    /// Upper bound on search pages fetched.
    #[arg(long, default_value_t = DEFAULT_MAX_PAGES)]
    pub max_pages: usize,

    /// Project root holding `landing/`, `standard/` and `docs/`.
    #[arg(long, default_value = ".")]
    pub root: PathBuf,
}

/// Look harvested books up in Google Books.
#[derive(Debug, Parser, Clone)]
#[command(name = "enrich", version, about = "Enrich harvested books from the Google Books API")]
pub struct EnrichArgs {
    /// Project root holding `landing/`.
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Pause between catalog lookups, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_ENRICH_PAUSE_MS)]
    pub pause_ms: u64,
}

/// Merge both landing tables into the standard layer.
#[derive(Debug, Parser, Clone)]
#[command(name = "integrate", version, about = "Integrate landing data into dim_book")]
pub struct IntegrateArgs {
    /// Project root holding `landing/`, `standard/` and `docs/`.
    #[arg(long, default_value = ".")]
    pub root: PathBuf,
}
