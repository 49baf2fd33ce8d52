use log::{debug, warn};
use url::form_urlencoded;
use url::Url;

use common::common::labels::Labels;
use common::common::tags::Tags;

use crate::config::BaseConfig;
use crate::discover::RawTarget;
use crate::metrics::config::ScraperOptions;

pub const METRICS_PATH_LABEL: &str = "__metrics_path__";
pub const PARAM_LABEL_PREFIX: &str = "__param_";
pub const DEFAULT_METRICS_PATH: &str = "/metrics";
pub const DEFAULT_SCHEME: &str = "https://";

/// Everything needed to scrape one discovered target. Owned by the task that scrapes it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeConfig {
    pub endpoint_url: String,
    pub tags: Tags,
    pub options: ScraperOptions,
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    Config(ScrapeConfig),
    Skip,
}

/// Resolves a discovered target against the instance configuration.
pub fn build(target: &RawTarget, base: &BaseConfig) -> BuildOutcome {
    let Some(address) = target.endpoints.first() else {
        warn!("skipping target without endpoints: labels {}", target.labels);
        return BuildOutcome::Skip;
    };

    let endpoint_url = url_from_target(address, &target.labels);
    if let Err(err) = Url::parse(&endpoint_url) {
        warn!("skipping target with invalid endpoint {}: {}", endpoint_url, err);
        return BuildOutcome::Skip;
    }

    let mut tags = base.tags.clone();
    tags.extend_from_labels(&target.labels);

    let mut options = base.scraper.clone();
    options.tag_by_endpoint = false;

    debug!("constructed scrape URL {} from labels {}", endpoint_url, target.labels);
    BuildOutcome::Config(ScrapeConfig {
        endpoint_url,
        tags,
        options,
        namespace: base.namespace.clone(),
    })
}

/// Builds configs for every usable target, in discovery order.
pub fn configs_from_targets(targets: &[RawTarget], base: &BaseConfig) -> Vec<ScrapeConfig> {
    targets
        .iter()
        .filter_map(|target| match build(target, base) {
            BuildOutcome::Config(config) => Some(config),
            BuildOutcome::Skip => None,
        })
        .collect()
}

fn url_from_target(address: &str, labels: &Labels) -> String {
    let mut url = if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("{}{}", DEFAULT_SCHEME, address)
    };
    url.truncate(url.trim_end_matches('/').len());

    let path = labels.get(METRICS_PATH_LABEL).unwrap_or(DEFAULT_METRICS_PATH);
    if !path.starts_with('/') {
        url.push('/');
    }
    url.push_str(path);

    let mut params = labels.with_prefix(PARAM_LABEL_PREFIX).peekable();
    if params.peek().is_some() {
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();
        url.push('?');
        url.push_str(&query);
    }
    url
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::{Credentials, DEFAULT_NAMESPACE};

    fn base() -> BaseConfig {
        BaseConfig {
            organization: "acme".into(),
            credentials: Credentials {
                token_id: "id".into(),
                token_secret: "secret".into(),
            },
            namespace: DEFAULT_NAMESPACE.into(),
            api_url: Url::parse("https://api.planetscale.com").unwrap(),
            timeout: Duration::from_secs(10),
            max_workers: 1,
            tags: Tags::from_iter(["team:db", "env:prod"]),
            emit_scrape_ok: false,
            scraper: ScraperOptions::default(),
        }
    }

    fn target(endpoints: &[&str], labels: &[(&str, &str)]) -> RawTarget {
        RawTarget {
            endpoints: endpoints.iter().map(|e| e.to_string()).collect(),
            labels: labels.iter().copied().collect(),
        }
    }

    fn config(outcome: BuildOutcome) -> ScrapeConfig {
        match outcome {
            BuildOutcome::Config(config) => config,
            BuildOutcome::Skip => panic!("target was skipped"),
        }
    }

    #[test]
    fn relative_metrics_path_gets_a_leading_slash() {
        let t = target(
            &["db1.example.com:8080"],
            &[("__metrics_path__", "status"), ("region", "us-east")],
        );
        let cfg = config(build(&t, &base()));
        assert_eq!(cfg.endpoint_url, "https://db1.example.com:8080/status");
        assert!(cfg.tags.contains("region:us-east"));
        assert_eq!(cfg.namespace, "planetscale");
    }

    #[test]
    fn explicit_scheme_and_trailing_slash() {
        let t = target(&["http://db1:9104/"], &[]);
        let cfg = config(build(&t, &base()));
        assert_eq!(cfg.endpoint_url, "http://db1:9104/metrics");
    }

    #[test]
    fn only_the_first_endpoint_is_scraped() {
        let t = target(&["db1:1", "db2:2"], &[]);
        let cfg = config(build(&t, &base()));
        assert_eq!(cfg.endpoint_url, "https://db1:1/metrics");
    }

    #[test]
    fn params_become_an_encoded_query() {
        let t = target(
            &["db1:8080"],
            &[
                ("__param_branch", "main"),
                ("__param_filter", "a b&c=d"),
                ("__metrics_path__", "/federate"),
            ],
        );
        let cfg = config(build(&t, &base()));
        let url = Url::parse(&cfg.endpoint_url).unwrap();
        assert_eq!(url.path(), "/federate");
        assert!(!cfg.endpoint_url.contains("__param_"));

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs.len(), 2);
        assert!(pairs.contains(&("branch".into(), "main".into())));
        assert!(pairs.contains(&("filter".into(), "a b&c=d".into())));
        assert!(cfg.endpoint_url.contains("filter=a+b%26c%3Dd"));
    }

    #[test]
    fn reserved_labels_never_become_tags() {
        let t = target(
            &["db1:8080"],
            &[("__param_x", "1"), ("__meta_cell", "c1"), ("database", "orders")],
        );
        let cfg = config(build(&t, &base()));
        assert_eq!(
            cfg.tags.into_vec(),
            vec!["database:orders", "env:prod", "team:db"]
        );
    }

    #[test]
    fn discovered_tags_dedupe_against_base_tags() {
        let t = target(&["db1:8080"], &[("env", "prod")]);
        let cfg = config(build(&t, &base()));
        assert_eq!(cfg.tags.len(), 2);
    }

    #[test]
    fn empty_endpoints_are_skipped() {
        let t = target(&[], &[("region", "us-east")]);
        assert_eq!(build(&t, &base()), BuildOutcome::Skip);
    }

    #[test]
    fn unparseable_endpoint_is_skipped() {
        let t = target(&["db1:notaport"], &[]);
        assert_eq!(build(&t, &base()), BuildOutcome::Skip);
    }

    #[test]
    fn building_twice_is_identical_and_leaves_base_alone() {
        let base = base();
        let before = base.tags.clone();
        let t = target(
            &["db1:8080"],
            &[("__param_a", "1"), ("__param_b", "2"), ("k", "v")],
        );

        let first = config(build(&t, &base));
        let second = config(build(&t, &base));
        assert_eq!(first.endpoint_url, second.endpoint_url);
        assert_eq!(first.tags, second.tags);
        assert_eq!(base.tags, before);
    }

    #[test]
    fn options_are_copied_with_endpoint_tagging_disabled() {
        let mut base = base();
        base.scraper.exclude_metrics = vec!["go_.*".into()];
        base.scraper.tag_by_endpoint = true;

        let cfg = config(build(&target(&["db1:8080"], &[]), &base));
        assert_eq!(cfg.options.exclude_metrics, vec!["go_.*"]);
        assert!(!cfg.options.tag_by_endpoint);
        assert_eq!(cfg.options.timeout, Duration::from_secs(10));
        assert_eq!(cfg.options.metric_limit, 0);
    }

    #[test]
    fn configs_keep_discovery_order_and_drop_skips() {
        let targets = vec![
            target(&["b:1"], &[]),
            target(&[], &[]),
            target(&["a:1"], &[]),
        ];
        let configs = configs_from_targets(&targets, &base());
        let urls: Vec<_> = configs.iter().map(|c| c.endpoint_url.as_str()).collect();
        assert_eq!(urls, vec!["https://b:1/metrics", "https://a:1/metrics"]);
    }
}
