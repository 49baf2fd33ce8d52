use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use log::{info, warn};

use common::common::tags::Tags;

pub const API_CAN_CONNECT: &str = "api.can_connect";
pub const TARGET_CAN_SCRAPE: &str = "target.can_scrape";

// Numeric values follow the agent's service check statuses.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Status {
    Ok = 0,
    Critical = 2,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => write!(f, "OK"),
            Status::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCheck {
    pub name: String,
    pub status: Status,
    pub message: Option<String>,
    pub tags: Tags,
}

/// Host-side receiver of service checks. Shared by every scrape task of a run.
pub trait ServiceCheckSink: Send + Sync {
    fn submit(&self, check: ServiceCheck);
}

/// Writes service checks to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ServiceCheckSink for LogSink {
    fn submit(&self, check: ServiceCheck) {
        let message = check.message.as_deref().unwrap_or("");
        match check.status {
            Status::Ok => info!("service check {} {} [{}] {}", check.name, check.status, check.tags, message),
            Status::Critical => warn!("service check {} {} [{}] {}", check.name, check.status, check.tags, message),
        }
    }
}

/// Collects service checks in memory, for hosts that drain them after each run.
#[derive(Debug, Default)]
pub struct MemorySink {
    checks: Mutex<Vec<ServiceCheck>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn checks(&self) -> Vec<ServiceCheck> {
        self.checks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn named(&self, name: &str) -> Vec<ServiceCheck> {
        self.checks()
            .into_iter()
            .filter(|c| c.name == name)
            .collect()
    }

    pub fn drain(&self) -> Vec<ServiceCheck> {
        std::mem::take(&mut *self.checks.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl ServiceCheckSink for MemorySink {
    fn submit(&self, check: ServiceCheck) {
        self.checks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(check);
    }
}

/// Names and forwards the two service checks this check emits.
#[derive(Clone)]
pub struct HealthReporter {
    sink: Arc<dyn ServiceCheckSink>,
    namespace: String,
}

impl HealthReporter {
    pub fn new(sink: Arc<dyn ServiceCheckSink>, namespace: impl Into<String>) -> Self {
        Self {
            sink,
            namespace: namespace.into(),
        }
    }

    pub fn check_name(&self, check: &str) -> String {
        format!("{}.{}", self.namespace, check)
    }

    pub fn api_can_connect(&self, status: Status, message: Option<String>, tags: Tags) {
        self.report(API_CAN_CONNECT, status, message, tags);
    }

    pub fn target_can_scrape(&self, status: Status, message: Option<String>, tags: Tags) {
        self.report(TARGET_CAN_SCRAPE, status, message, tags);
    }

    fn report(&self, check: &str, status: Status, message: Option<String>, tags: Tags) {
        self.sink.submit(ServiceCheck {
            name: self.check_name(check),
            status,
            message,
            tags,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checks_are_namespaced() {
        let sink = Arc::new(MemorySink::new());
        let reporter = HealthReporter::new(sink.clone(), "planetscale");

        reporter.api_can_connect(Status::Ok, None, Tags::from_iter(["planetscale_org:acme"]));
        reporter.target_can_scrape(Status::Critical, Some("boom".into()), Tags::new());

        let checks = sink.drain();
        assert_eq!(checks.len(), 2);
        assert_eq!(checks[0].name, "planetscale.api.can_connect");
        assert_eq!(checks[0].status, Status::Ok);
        assert!(checks[0].tags.contains("planetscale_org:acme"));
        assert_eq!(checks[1].name, "planetscale.target.can_scrape");
        assert_eq!(checks[1].message.as_deref(), Some("boom"));
        assert!(sink.checks().is_empty());
    }

    #[test]
    fn memory_sink_is_shared_across_threads() {
        let sink = Arc::new(MemorySink::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let reporter = HealthReporter::new(sink.clone(), "ns");
                std::thread::spawn(move || {
                    reporter.target_can_scrape(Status::Ok, None, Tags::from_iter([format!("i:{i}")]))
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(sink.named("ns.target.can_scrape").len(), 8);
    }
}
