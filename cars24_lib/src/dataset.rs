//! CSV export and import of the listing collection.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use cars24_api::types::CarListing;
use tracing::info;

use crate::error::Cars24Error;

/// Default dataset location relative to the output root.
pub const DATASET_PATH: &str = "data/cars24_listings.csv";

/// Writes listings as CSV with a header row. Missing values are empty cells.
pub fn write_csv<W: Write>(writer: W, listings: &[CarListing]) -> Result<(), Cars24Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for listing in listings {
        wtr.serialize(listing)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_csv<R: Read>(reader: R) -> Result<Vec<CarListing>, Cars24Error> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut listings: Vec<CarListing> = Vec::new();
    for record in rdr.deserialize::<CarListing>() {
        listings.push(record?);
    }
    Ok(listings)
}

/// Writes the CSV to `path`, creating parent directories as needed.
pub fn save_csv(path: &Path, listings: &[CarListing]) -> Result<(), Cars24Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(path)?;
    write_csv(file, listings)?;
    info!("Wrote {} listings to {}", listings.len(), path.display());
    Ok(())
}

pub fn load_csv(path: &Path) -> Result<Vec<CarListing>, Cars24Error> {
    let file = fs::File::open(path)?;
    let listings = read_csv(file)?;
    info!("Loaded {} listings from {}", listings.len(), path.display());
    Ok(listings)
}
