//! Top-level application orchestration.
//!
//! The binaries under `src/bin/` are intentionally tiny; this module is the
//! "real main" for each of them:
//! - parses CLI arguments
//! - initializes logging
//! - runs the stage workflow from `pipeline`
//! - prints the stage summary

use std::time::Duration;

use chrono::Utc;
use clap::Parser;

use crate::cli::{EnrichArgs, HarvestArgs, IntegrateArgs};
use crate::data::Throttle;
use crate::domain::{EnrichConfig, HarvestConfig, Layout};
use crate::error::AppError;

pub mod pipeline;

/// Pause between Goodreads requests: base plus uniform jitter.
const HARVEST_PAUSE: Duration = Duration::from_millis(800);
const HARVEST_JITTER: Duration = Duration::from_millis(700);

/// Entry point for the `harvest` binary.
pub fn run_harvest() -> Result<(), AppError> {
    let args = HarvestArgs::parse();
    crate::logging::init();

    let config = harvest_config_from_args(&args);
    let layout = Layout::new(&args.root);
    let throttle = Throttle::jittered(HARVEST_PAUSE, HARVEST_JITTER);

    let mut echoed = 0usize;
    let headless = config.headless;
    let run = pipeline::run_harvest(&config, &layout, &throttle, |record| {
        if !headless {
            echoed += 1;
            println!("{}", crate::report::format_harvest_row(echoed, record));
        }
    })?;

    println!(
        "{}",
        crate::report::format_harvest_summary(&run, &config, &layout.harvest_json())
    );
    Ok(())
}

/// Entry point for the `enrich` binary.
pub fn run_enrich() -> Result<(), AppError> {
    let args = EnrichArgs::parse();
    crate::logging::init();

    let config = enrich_config_from_args(&args);
    let layout = Layout::new(&args.root);
    let out = pipeline::run_enrich(&config, &layout)?;

    println!(
        "{}",
        crate::report::format_enrich_summary(&out.run, out.inputs, out.meta.authenticated, &layout.enrichment_csv())
    );
    Ok(())
}

/// Entry point for the `integrate` binary.
pub fn run_integrate() -> Result<(), AppError> {
    let args = IntegrateArgs::parse();
    crate::logging::init();

    let layout = Layout::new(&args.root);
    let out = pipeline::run_integrate(&layout, Utc::now())?;

    println!(
        "{}",
        crate::report::format_integrate_summary(
            &out.integration.metrics,
            out.integration.details.len(),
            &layout.standard()
        )
    );
    if out.rows_rejected > 0 {
        println!("Rejected enrichment rows: {}", out.rows_rejected);
    }
    Ok(())
}

pub fn harvest_config_from_args(args: &HarvestArgs) -> HarvestConfig {
    HarvestConfig {
        query: args.query.clone(),
        min_items: args.min_items,
        headless: args.headless && !args.no_headless,
        max_pages: args.max_pages,
    }
}

pub fn enrich_config_from_args(args: &EnrichArgs) -> EnrichConfig {
    EnrichConfig {
        pause: Duration::from_millis(args.pause_ms),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_headless_wins_over_default() {
        let args = HarvestArgs::parse_from(["harvest", "--no-headless", "--min-items", "3"]);
        let config = harvest_config_from_args(&args);
        assert!(!config.headless);
        assert_eq!(config.min_items, 3);

        let defaults = harvest_config_from_args(&HarvestArgs::parse_from(["harvest"]));
        assert_eq!(defaults, HarvestConfig::default());
    }

    #[test]
    fn pause_flag_maps_to_duration() {
        let args = EnrichArgs::parse_from(["enrich", "--pause-ms", "50"]);
        assert_eq!(enrich_config_from_args(&args).pause, Duration::from_millis(50));
        assert_eq!(
            enrich_config_from_args(&EnrichArgs::parse_from(["enrich"])),
            EnrichConfig::default()
        );
    }
}
