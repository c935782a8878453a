//! Library layer for the cars24 scraper: extraction, normalization, sample
//! fallback, and market analysis.
//!
//! Wraps the `cars24_api` page fetcher with the scrape-with-fallback
//! acquisition pipeline, the embedded target catalog, input validation and
//! CSV dataset I/O.

pub mod acquire;
pub mod analysis;
pub mod config;
pub mod dataset;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod sample;
pub mod targets;
pub mod validation;

pub use cars24_api;
pub use cars24_api::types;
pub use cars24_api::types::{CarListing, Source};

pub use acquire::{acquire, Acquisition, CityOutcome};
pub use analysis::{summarize, MarketSummary, QualityGrade};
pub use config::ScrapeConfig;
pub use error::Cars24Error;
pub use extract::{extract, ExtractRules, Extraction, RawFragment};
pub use targets::{load_target_catalog, TargetCatalog, TargetCatalogError};
