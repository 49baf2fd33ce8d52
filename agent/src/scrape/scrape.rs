use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::FutureExt;
use log::{debug, error};

use common::common::tags::Tags;

use crate::health::{HealthReporter, Status};
use crate::metrics::Metrics;
use crate::scrape::target::ScrapeConfig;
use crate::scrape::ScrapeError;

/// A single fetch-parse-submit cycle against one endpoint.
#[async_trait]
pub trait Scraper: Send + Sync {
    async fn scrape(&self) -> Result<(), ScrapeError>;
}

/// Builds a scraper from a fully resolved config. The config, including its namespace,
/// is handed over by value so no scraper state is shared between tasks.
pub trait ScraperFactory: Send + Sync {
    fn create(&self, config: ScrapeConfig) -> Result<Box<dyn Scraper>, ScrapeError>;
}

/// Runs one scrape and turns its outcome into a `target.can_scrape` report.
#[derive(Clone)]
pub struct Executor {
    factory: Arc<dyn ScraperFactory>,
    reporter: HealthReporter,
    metrics: Arc<Metrics>,
    organization: String,
    emit_ok: bool,
}

impl Executor {
    pub fn new(
        factory: Arc<dyn ScraperFactory>,
        reporter: HealthReporter,
        metrics: Arc<Metrics>,
        organization: impl Into<String>,
        emit_ok: bool,
    ) -> Self {
        Self {
            factory,
            reporter,
            metrics,
            organization: organization.into(),
            emit_ok,
        }
    }

    /// Builds the scraper and awaits its scrape. Panics inside the collaborator are
    /// converted into [`ScrapeError::Panicked`].
    pub async fn execute(&self, config: ScrapeConfig) -> Result<(), ScrapeError> {
        let endpoint = config.endpoint_url.clone();
        let start = Instant::now();
        debug!("scraping metrics from {} (namespace {})", endpoint, config.namespace);

        let factory = &self.factory;
        let result = AssertUnwindSafe(async move {
            let scraper = factory.create(config)?;
            scraper.scrape().await
        })
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
            Err(ScrapeError::Panicked {
                endpoint,
                message: panic_message(panic),
            })
        });

        self.metrics
            .scrape_duration
            .with_label_values(&[self.organization.as_str()])
            .observe(start.elapsed().as_secs_f64());
        let status = if result.is_ok() { "ok" } else { "error" };
        self.metrics
            .scrapes
            .with_label_values(&[self.organization.as_str(), status])
            .inc();
        result
    }

    /// Emits the health signal for a finished scrape.
    pub fn report(&self, endpoint: &str, tags: Tags, outcome: &Result<(), ScrapeError>) {
        let tags = tags.with(format!("endpoint:{}", endpoint));
        match outcome {
            Ok(()) => {
                if self.emit_ok {
                    self.reporter.target_can_scrape(Status::Ok, None, tags);
                }
            }
            Err(err) => {
                error!("error scraping metrics from {}: {}", endpoint, err);
                self.reporter
                    .target_can_scrape(Status::Critical, Some(err.to_string()), tags);
            }
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
