use std::sync::Arc;

use crate::health::ServiceCheckSink;
use crate::metrics::Metrics;
use crate::scrape::ScraperFactory;

/// Host collaborators handed to every check instance.
#[derive(Clone)]
pub struct Options {
    pub id: String,
    pub scrapers: Arc<dyn ScraperFactory>,
    pub service_checks: Arc<dyn ServiceCheckSink>,
    pub metrics: Arc<Metrics>,
}

impl Options {
    pub fn with_id(&self, id: impl Into<String>) -> Options {
        Options {
            id: id.into(),
            ..self.clone()
        }
    }
}
