use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry};

pub mod config;

/// Self-telemetry for the check, registered once per process and shared by all instances.
#[derive(Debug, Clone)]
pub struct Metrics {
    pub discovery_requests: IntCounterVec,
    pub discovered_targets: IntGaugeVec,
    pub scrapes: IntCounterVec,
    pub scrape_duration: HistogramVec,
}

impl Metrics {
    pub fn new(reg: &Registry) -> prometheus::Result<Metrics> {
        let discovery_requests = IntCounterVec::new(
            Opts::new(
                "planetscale_discovery_requests_total",
                "Total number of discovery API requests, by outcome.",
            ),
            &["organization", "status"],
        )?;
        let discovered_targets = IntGaugeVec::new(
            Opts::new(
                "planetscale_discovered_targets",
                "Number of targets returned by the last discovery request.",
            ),
            &["organization"],
        )?;
        let scrapes = IntCounterVec::new(
            Opts::new(
                "planetscale_scrapes_total",
                "Total number of target scrapes, by outcome.",
            ),
            &["organization", "status"],
        )?;
        let scrape_duration = HistogramVec::new(
            HistogramOpts::new(
                "planetscale_scrape_duration_seconds",
                "Time spent scraping a single target.",
            ),
            &["organization"],
        )?;

        reg.register(Box::new(discovery_requests.clone()))?;
        reg.register(Box::new(discovered_targets.clone()))?;
        reg.register(Box::new(scrapes.clone()))?;
        reg.register(Box::new(scrape_duration.clone()))?;

        Ok(Metrics {
            discovery_requests,
            discovered_targets,
            scrapes,
            scrape_duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_every_family() {
        let reg = Registry::new();
        let metrics = Metrics::new(&reg).unwrap();
        metrics.scrapes.with_label_values(&["acme", "ok"]).inc();
        metrics.discovered_targets.with_label_values(&["acme"]).set(3);
        metrics.discovery_requests.with_label_values(&["acme", "ok"]).inc();
        metrics.scrape_duration.with_label_values(&["acme"]).observe(0.2);

        let names: Vec<_> = reg.gather().iter().map(|f| f.get_name().to_string()).collect();
        assert_eq!(names.len(), 4);
        assert!(names.contains(&"planetscale_scrapes_total".to_string()));
    }

    #[test]
    fn registering_twice_fails() {
        let reg = Registry::new();
        Metrics::new(&reg).unwrap();
        assert!(Metrics::new(&reg).is_err());
    }
}
