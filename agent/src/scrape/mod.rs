use thiserror::Error;

pub mod manager;
pub mod openmetrics;
pub mod scrape;
pub mod target;

pub use manager::{Manager, RunSummary};
pub use scrape::{Executor, Scraper, ScraperFactory};
pub use target::{BuildOutcome, ScrapeConfig};

/// Why a single target could not be scraped. Reported, never propagated.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Error setting up scraper for {endpoint}: {message}")]
    Setup { endpoint: String, message: String },
    #[error("Timeout scraping {endpoint}: {message}")]
    Timeout { endpoint: String, message: String },
    #[error("Error connecting to {endpoint}: {message}")]
    Transport { endpoint: String, message: String },
    #[error("{endpoint} returned HTTP status {status}")]
    Http { endpoint: String, status: u16 },
    #[error("Error submitting metrics from {endpoint}: {message}")]
    Submit { endpoint: String, message: String },
    #[error("Scrape of {endpoint} panicked: {message}")]
    Panicked { endpoint: String, message: String },
}
