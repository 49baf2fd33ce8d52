use log::debug;

use common::common::tags::Tags;

use crate::metrics::config::ScraperOptions;

/// An unparsed exposition fetched from one target, together with everything the host
/// pipeline needs to parse, filter and tag it.
#[derive(Debug, Clone)]
pub struct RawExposition {
    pub namespace: String,
    pub endpoint: String,
    pub tags: Tags,
    pub content_type: Option<String>,
    pub body: String,
    pub options: ScraperOptions,
}

/// Host metric pipeline. Parsing and submission happen behind this trait.
pub trait Appender: Send + Sync {
    fn append(&self, exposition: RawExposition) -> anyhow::Result<()>;
}

/// Logs what would be submitted. Used when no host pipeline is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAppender;

impl Appender for LogAppender {
    fn append(&self, exposition: RawExposition) -> anyhow::Result<()> {
        debug!(
            "received {} bytes ({}) from {} for namespace {} [{}]",
            exposition.body.len(),
            exposition.content_type.as_deref().unwrap_or("unknown content type"),
            exposition.endpoint,
            exposition.namespace,
            exposition.tags
        );
        Ok(())
    }
}
