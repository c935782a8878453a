//! The `run` subcommand: scrape, analyze and report in one pass.

use std::path::Path;

use anyhow::Result;
use cars24_lib::analysis::{summarize, DEFAULT_BINS};
use cars24_lib::{validation, TargetCatalog};
use chrono::Utc;
use clap::Args;

use crate::commands::report::write_artifacts;
use crate::commands::scrape::{acquire_and_save, ScrapeArgs};
use crate::output::{print_summary, OutputFormat};
use crate::report::ReportContext;

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub scrape: ScrapeArgs,

    /// Number of price distribution bins (1-50)
    #[arg(long, default_value_t = DEFAULT_BINS)]
    pub bins: usize,
}

pub async fn run(
    args: &RunArgs,
    catalog: &TargetCatalog,
    out_dir: &Path,
    format: OutputFormat,
) -> Result<()> {
    // Validate before spending time on the network.
    let bins = validation::validate_bins(args.bins)?;

    let acquisition = acquire_and_save(&args.scrape, catalog, out_dir).await?;
    let summary = summarize(&acquisition.listings, catalog, bins);
    let ctx = ReportContext {
        generated_at: Utc::now(),
        brand: catalog.brand.clone(),
        fallback_reason: acquisition.fallback_reason.clone(),
    };
    write_artifacts(&summary, &ctx, out_dir)?;
    print_summary(&summary, format)
}
