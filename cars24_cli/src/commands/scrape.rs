//! The `scrape` subcommand: acquires listings and writes the CSV dataset.

use std::path::Path;

use anyhow::{Context, Result};
use cars24_lib::acquire::{acquire, resolve_cities, Acquisition};
use cars24_lib::dataset::{save_csv, DATASET_PATH};
use cars24_lib::validation;
use cars24_lib::{ScrapeConfig, TargetCatalog};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use crate::output::{print_listings, OutputFormat};

/// Arguments for the `scrape` subcommand. Flags override `CARS24_*`
/// environment variables.
#[derive(Args, Clone)]
pub struct ScrapeArgs {
    /// Cities to scrape (comma-separated names or aliases). Defaults to the
    /// catalog's default cities.
    #[arg(long)]
    pub cities: Option<String>,

    /// Skip the network and generate sample data
    #[arg(long)]
    pub offline: bool,

    /// Maximum listings kept per city
    #[arg(long)]
    pub max_per_city: Option<usize>,

    /// Number of sample listings generated on fallback
    #[arg(long)]
    pub sample_size: Option<usize>,
}

/// Builds the run configuration: defaults, then environment, then flags.
pub fn build_config(args: &ScrapeArgs, catalog: &TargetCatalog) -> Result<ScrapeConfig> {
    let mut config = ScrapeConfig::from_env()?;
    if let Some(ref cities) = args.cities {
        config.cities = validation::validate_cities(catalog, cities)?;
    }
    if let Some(n) = args.max_per_city {
        config.max_listings_per_city = validation::validate_max_per_city(n)?;
    }
    if let Some(n) = args.sample_size {
        config.sample_size = validation::validate_sample_size(n)?;
    }
    config.offline = args.offline;
    Ok(config)
}

/// Acquires listings and saves them to `<out_dir>/data/cars24_listings.csv`.
pub async fn acquire_and_save(
    args: &ScrapeArgs,
    catalog: &TargetCatalog,
    out_dir: &Path,
) -> Result<Acquisition> {
    let config = build_config(args, catalog)?;
    let city_count = resolve_cities(catalog, &config.cities)?.len();

    let pb = if config.offline {
        ProgressBar::hidden()
    } else {
        eprintln!("Scraping {} cities from {}", city_count, config.base_url);
        ProgressBar::new(city_count as u64)
    };
    pb.set_style(ProgressStyle::with_template(
        "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>3}/{len:3} {msg}",
    )?);
    pb.set_message("fetching listing pages...");

    let acquisition = acquire(&config, catalog, |outcome| {
        pb.set_message(format!("{}: {} listings", outcome.city, outcome.listings));
        pb.inc(1);
    })
    .await?;

    pb.finish_with_message(format!(
        "{} scraped, {} sample",
        acquisition.scraped_count(),
        acquisition.sample_count()
    ));

    for outcome in acquisition.outcomes.iter().filter(|o| !o.succeeded()) {
        eprintln!(
            "  {}: no listings ({})",
            outcome.city,
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }
    if let Some(reason) = &acquisition.fallback_reason {
        eprintln!(
            "Using {} sample listings ({}). These are synthetic, not real prices.",
            acquisition.listings.len(),
            reason
        );
    }

    let path = out_dir.join(DATASET_PATH);
    save_csv(&path, &acquisition.listings)
        .with_context(|| format!("cannot write dataset to {}", path.display()))?;
    eprintln!("Saved {} listings to {}", acquisition.listings.len(), path.display());

    Ok(acquisition)
}

pub async fn run(
    args: &ScrapeArgs,
    catalog: &TargetCatalog,
    out_dir: &Path,
    format: OutputFormat,
) -> Result<()> {
    let acquisition = acquire_and_save(args, catalog, out_dir).await?;
    print_listings(&acquisition.listings, format)
}
