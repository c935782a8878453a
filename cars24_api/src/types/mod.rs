mod listing;
pub use self::listing::{CarListing, Source};
