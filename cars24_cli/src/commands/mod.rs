//! CLI subcommand implementations.

pub mod analyze;
pub mod report;
pub mod run;
pub mod scrape;
