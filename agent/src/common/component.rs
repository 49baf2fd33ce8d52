use async_trait::async_trait;

use crate::scrape::RunSummary;

/// A check instance the host runs once per scheduling cycle.
#[async_trait]
pub trait Component: Send + Sync {
    fn id(&self) -> &str;

    /// Runs one full cycle. Never fails: every runtime problem is reported as a
    /// service check instead.
    async fn run(&self) -> RunSummary;
}
