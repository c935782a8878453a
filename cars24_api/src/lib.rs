mod client;
mod errors;
mod target;
pub mod types;
mod user_agent;
pub use self::client::{Client, DEFAULT_BACKOFF, DEFAULT_BASE_URL, DEFAULT_MAX_ATTEMPTS, DEFAULT_TIMEOUT};
pub use self::errors::Error;
pub use self::target::{ListingTarget, CITY_PLACEHOLDER};
pub use self::user_agent::get_user_agent;
