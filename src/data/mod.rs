//! Upstream data sources.
//!
//! - Goodreads search scraping (`goodreads`) and its HTML helpers (`html`)
//! - Google Books catalog lookups (`google_books`)
//! - request pacing (`throttle`)

pub mod google_books;
pub mod goodreads;
pub mod html;
pub mod throttle;

pub use google_books::{CatalogLookup, GoogleBooksClient};
pub use goodreads::{GoodreadsClient, PageFetcher};
pub use throttle::Throttle;
