use std::sync::Arc;

use log::{debug, error};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::scrape::scrape::Executor;
use crate::scrape::target::ScrapeConfig;

/// Counts for one check run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub discovered: usize,
    pub skipped: usize,
    pub scheduled: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Fans scrape configs out over a bounded pool of tasks.
pub struct Manager {
    executor: Executor,
    max_workers: usize,
}

impl Manager {
    pub fn new(executor: Executor, max_workers: usize) -> Self {
        Manager {
            executor,
            max_workers: max_workers.clamp(1, Semaphore::MAX_PERMITS),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Scrapes every config exactly once with at most `max_workers` scrapes in flight,
    /// and returns once all of them have finished.
    pub async fn run(&self, configs: Vec<ScrapeConfig>) -> RunSummary {
        let mut summary = RunSummary {
            scheduled: configs.len(),
            ..Default::default()
        };
        debug!(
            "scraping {} targets with concurrency {}",
            configs.len(),
            self.max_workers
        );

        let permits = Arc::new(Semaphore::new(self.max_workers));
        let mut tasks = JoinSet::new();
        for config in configs {
            let permits = Arc::clone(&permits);
            let executor = self.executor.clone();
            tasks.spawn(async move {
                // The semaphore is never closed.
                let Ok(_permit) = permits.acquire_owned().await else {
                    return false;
                };
                let endpoint = config.endpoint_url.clone();
                let tags = config.tags.clone();
                let outcome = executor.execute(config).await;
                executor.report(&endpoint, tags, &outcome);
                outcome.is_ok()
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(true) => summary.succeeded += 1,
                Ok(false) => summary.failed += 1,
                Err(err) => {
                    error!("error in target processing: {}", err);
                    summary.failed += 1;
                }
            }
        }
        summary
    }
}
