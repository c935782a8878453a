mod charts;
mod commands;
mod output;
mod report;

use std::path::PathBuf;

use anyhow::{Context, Result};
use cars24_lib::load_target_catalog;
use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "cars24")]
#[command(about = "Scrape used-car listings from cars24.com and report on the market")]
struct Cli {
    /// Output format: table, json, csv or markdown
    #[arg(long, default_value = "table", global = true)]
    output: String,

    /// Root directory for data/, images/ and reports/
    #[arg(long, default_value = ".", global = true)]
    out_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape listings (sample data on failure) and save the CSV dataset
    Scrape(commands::scrape::ScrapeArgs),
    /// Print market statistics for a saved dataset
    Analyze(commands::analyze::AnalyzeArgs),
    /// Write charts and reports for a saved dataset
    Report(commands::report::ReportArgs),
    /// Scrape, then write charts and reports
    Run(commands::run::RunArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cars24=info".parse()?)
                .add_directive("cars24_lib=info".parse()?)
                .add_directive("cars24_api=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::parse(&cli.output)?;
    let catalog = load_target_catalog().context("embedded target catalog is invalid")?;

    match &cli.command {
        Commands::Scrape(args) => commands::scrape::run(args, &catalog, &cli.out_dir, format).await?,
        Commands::Analyze(args) => commands::analyze::run(args, &catalog, &cli.out_dir, format)?,
        Commands::Report(args) => commands::report::run(args, &catalog, &cli.out_dir)?,
        Commands::Run(args) => commands::run::run(args, &catalog, &cli.out_dir, format).await?,
    }

    Ok(())
}
