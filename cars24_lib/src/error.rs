//! Error types for the library layer.

use std::fmt;

/// Errors produced by the library layer: dataset I/O and input validation.
///
/// Scrape failures are absorbed by the fallback chain and recorded on each
/// city outcome, so they never surface here.
#[derive(Debug)]
pub enum Cars24Error {
    /// Reading or writing the CSV dataset failed.
    Csv(csv::Error),
    /// A filesystem operation failed.
    Io(std::io::Error),
    /// User-provided input failed validation.
    InvalidInput(String),
}

impl fmt::Display for Cars24Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv(e) => write!(f, "CSV error: {}", e),
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for Cars24Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Csv(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::InvalidInput(_) => None,
        }
    }
}

impl From<csv::Error> for Cars24Error {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e)
    }
}

impl From<std::io::Error> for Cars24Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
