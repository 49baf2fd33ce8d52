pub mod appender;
pub mod check;
pub mod common;
pub mod config;
pub mod discover;
pub mod health;
pub mod metrics;
pub mod scrape;
