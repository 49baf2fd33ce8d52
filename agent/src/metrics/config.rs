use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_METRIC_LIMIT: u64 = 0;

/// OpenMetrics scraper options copied verbatim from the instance configuration into
/// every per-target scrape. Every field has a default so a scraper never sees a hole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperOptions {
    /// Metric names or `{raw_name: renamed}` mappings to collect; empty collects everything.
    pub metrics: Vec<serde_json::Value>,
    pub exclude_metrics: Vec<String>,
    pub metadata_metrics: Vec<String>,
    pub metadata_label_map: BTreeMap<String, String>,
    pub prometheus_metrics_prefix: String,
    pub label_joins: BTreeMap<String, serde_json::Value>,
    pub labels_mapper: BTreeMap<String, String>,
    pub type_overrides: BTreeMap<String, String>,
    pub histogram_buckets_as_distributions: bool,
    pub non_cumulative_histogram_buckets: bool,
    pub raw_metric_prefix: String,
    pub cache_metric_wildcards: bool,
    pub monotonic_counter: bool,
    pub telemetry: bool,
    pub ignore_tags: Vec<String>,
    pub remap_metric_names: bool,
    /// Cap on metrics collected per endpoint; 0 collects everything.
    pub metric_limit: u64,

    pub ssl_verify: bool,
    pub ssl_cert: Option<PathBuf>,
    pub ssl_private_key: Option<PathBuf>,
    pub ssl_ca_cert: Option<PathBuf>,

    /// Resolved from the instance / init_config `timeout` keys.
    #[serde(skip)]
    pub timeout: Duration,
    /// Discovered targets are tagged by their labels instead of their endpoint.
    #[serde(skip)]
    pub tag_by_endpoint: bool,
}

impl Default for ScraperOptions {
    fn default() -> Self {
        Self {
            metrics: Vec::new(),
            exclude_metrics: Vec::new(),
            metadata_metrics: Vec::new(),
            metadata_label_map: BTreeMap::new(),
            prometheus_metrics_prefix: String::new(),
            label_joins: BTreeMap::new(),
            labels_mapper: BTreeMap::new(),
            type_overrides: BTreeMap::new(),
            histogram_buckets_as_distributions: true,
            non_cumulative_histogram_buckets: false,
            raw_metric_prefix: String::new(),
            cache_metric_wildcards: true,
            monotonic_counter: true,
            telemetry: true,
            ignore_tags: Vec::new(),
            remap_metric_names: true,
            metric_limit: DEFAULT_METRIC_LIMIT,
            ssl_verify: true,
            ssl_cert: None,
            ssl_private_key: None,
            ssl_ca_cert: None,
            timeout: DEFAULT_TIMEOUT,
            tag_by_endpoint: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let options: ScraperOptions =
            serde_yaml::from_str("exclude_metrics: [go_gc_duration_seconds]\nmonotonic_counter: false\n")
                .unwrap();
        assert_eq!(options.exclude_metrics, vec!["go_gc_duration_seconds"]);
        assert!(!options.monotonic_counter);
        assert!(options.histogram_buckets_as_distributions);
        assert!(options.ssl_verify);
        assert_eq!(options.timeout, DEFAULT_TIMEOUT);
        assert!(!options.tag_by_endpoint);
        assert_eq!(options.metric_limit, 0);
    }

    #[test]
    fn metric_limit_can_be_set() {
        let options: ScraperOptions = serde_yaml::from_str("metric_limit: 2000\n").unwrap();
        assert_eq!(options.metric_limit, 2000);
    }

    #[test]
    fn metrics_accept_names_and_renames() {
        let options: ScraperOptions =
            serde_yaml::from_str("metrics:\n  - vtgate_.*\n  - mysql_up: up\n").unwrap();
        assert_eq!(options.metrics.len(), 2);
        assert_eq!(options.metrics[0], serde_json::json!("vtgate_.*"));
        assert_eq!(options.metrics[1], serde_json::json!({"mysql_up": "up"}));
    }
}
