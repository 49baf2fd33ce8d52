use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Missing '{0}' in instance configuration.")]
    MissingConfig(&'static str),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
