//! The single record type produced by a run.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provenance of a listing: scraped from the site or generated as sample data.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Scraped,
    Sample,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Scraped => "scraped",
            Source::Sample => "sample",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scraped" => Ok(Source::Scraped),
            "sample" => Ok(Source::Sample),
            other => Err(format!("unknown source '{}'", other)),
        }
    }
}

/// One used-car listing.
///
/// Numeric fields are `None` when the page did not carry a parseable,
/// plausible value. Text fields fall back to `"Unknown"` instead.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CarListing {
    /// Display title, e.g. "2019 Maruti Suzuki Swift VXI".
    pub title: String,

    /// Asking price in whole rupees.
    pub price: Option<i64>,

    /// Year of manufacture.
    pub year: Option<i32>,

    /// Odometer reading.
    pub kilometers: Option<i64>,

    /// Canonical city name, e.g. "Bangalore".
    pub city: String,

    pub fuel_type: String,

    pub transmission: String,

    /// Whether the record came from the site or from the sample generator.
    pub source: Source,

    pub scraped_at: DateTime<Utc>,
}

impl CarListing {
    pub fn is_sample(&self) -> bool {
        self.source == Source::Sample
    }

    /// True when price, year and kilometers are all present.
    pub fn has_complete_data(&self) -> bool {
        self.price.is_some() && self.year.is_some() && self.kilometers.is_some()
    }
}
