//! The `analyze` subcommand: prints market statistics for a saved dataset.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use cars24_lib::analysis::{summarize, DEFAULT_BINS};
use cars24_lib::dataset::{load_csv, DATASET_PATH};
use cars24_lib::types::CarListing;
use cars24_lib::{validation, TargetCatalog};
use clap::Args;

use crate::output::{print_summary, OutputFormat};

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Dataset to read. Defaults to <out-dir>/data/cars24_listings.csv
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Number of price distribution bins (1-50)
    #[arg(long, default_value_t = DEFAULT_BINS)]
    pub bins: usize,
}

/// Loads the dataset named by `input`, or the default one under `out_dir`.
pub fn load_dataset(input: Option<&Path>, out_dir: &Path) -> Result<Vec<CarListing>> {
    let path = match input {
        Some(p) => p.to_path_buf(),
        None => out_dir.join(DATASET_PATH),
    };
    if !path.exists() {
        bail!(
            "dataset {} not found. Run `cars24 scrape` first or pass --input",
            path.display()
        );
    }
    let listings =
        load_csv(&path).with_context(|| format!("cannot read dataset {}", path.display()))?;
    if listings.is_empty() {
        bail!("dataset {} has no listings", path.display());
    }
    Ok(listings)
}

pub fn run(
    args: &AnalyzeArgs,
    catalog: &TargetCatalog,
    out_dir: &Path,
    format: OutputFormat,
) -> Result<()> {
    let bins = validation::validate_bins(args.bins)?;
    let listings = load_dataset(args.input.as_deref(), out_dir)?;
    let summary = summarize(&listings, catalog, bins);
    print_summary(&summary, format)
}
