use thiserror::Error;

pub mod discover;
pub mod planetscale;

pub use discover::{Arguments, RawTarget};
pub use planetscale::PlanetscaleDiscovery;

/// Why the discovery API could not produce a target list.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Timeout connecting to PlanetScale API endpoint {url}: {message}")]
    Timeout { url: String, message: String },
    #[error("Error connecting to PlanetScale API endpoint {url}: {message}")]
    Transport { url: String, message: String },
    #[error("PlanetScale API endpoint {url} returned HTTP status {status}")]
    Http { url: String, status: u16 },
    #[error("Unexpected response from PlanetScale API endpoint {url}: {message}")]
    Decode { url: String, message: String },
}

impl DiscoveryError {
    /// Short outcome label used by the discovery request counter.
    pub fn kind(&self) -> &'static str {
        match self {
            DiscoveryError::Timeout { .. } => "timeout",
            DiscoveryError::Transport { .. } => "transport",
            DiscoveryError::Http { .. } => "http",
            DiscoveryError::Decode { .. } => "decode",
        }
    }
}
