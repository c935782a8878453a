//! The `report` subcommand: writes charts and reports for a saved dataset.

use std::path::{Path, PathBuf};

use anyhow::Result;
use cars24_lib::analysis::{summarize, MarketSummary, DEFAULT_BINS};
use cars24_lib::{validation, TargetCatalog};
use chrono::Utc;
use clap::Args;

use crate::charts::write_charts;
use crate::commands::analyze::load_dataset;
use crate::report::{write_reports, ReportContext};

#[derive(Args)]
pub struct ReportArgs {
    /// Dataset to read. Defaults to <out-dir>/data/cars24_listings.csv
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Number of price distribution bins (1-50)
    #[arg(long, default_value_t = DEFAULT_BINS)]
    pub bins: usize,
}

/// Writes charts and reports, printing each path to stderr.
pub fn write_artifacts(summary: &MarketSummary, ctx: &ReportContext, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = write_charts(summary, out_dir)?;
    paths.extend(write_reports(summary, ctx, out_dir)?);
    for path in &paths {
        eprintln!("  wrote {}", path.display());
    }
    Ok(paths)
}

pub fn run(args: &ReportArgs, catalog: &TargetCatalog, out_dir: &Path) -> Result<()> {
    let bins = validation::validate_bins(args.bins)?;
    let listings = load_dataset(args.input.as_deref(), out_dir)?;
    let summary = summarize(&listings, catalog, bins);
    let ctx = ReportContext {
        generated_at: Utc::now(),
        brand: catalog.brand.clone(),
        fallback_reason: None,
    };
    let paths = write_artifacts(&summary, &ctx, out_dir)?;
    eprintln!("Generated {} files for {} listings", paths.len(), listings.len());
    Ok(())
}
