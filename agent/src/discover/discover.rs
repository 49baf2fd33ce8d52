use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

use common::common::labels::Labels;

use crate::config::{BaseConfig, Credentials};

/// One record of the discovery response: `{"targets": [...], "labels": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTarget {
    #[serde(rename = "targets", default, deserialize_with = "null_as_empty")]
    pub endpoints: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub labels: Labels,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone)]
pub struct Arguments {
    pub api_url: Url,
    pub organization: String,
    pub credentials: Credentials,
    pub timeout: Duration,
    pub tls_verify: bool,
}

impl Arguments {
    pub fn from_config(cfg: &BaseConfig) -> Self {
        Self {
            api_url: cfg.api_url.clone(),
            organization: cfg.organization.clone(),
            credentials: cfg.credentials.clone(),
            timeout: cfg.timeout,
            tls_verify: cfg.tls_verify(),
        }
    }

    /// `{api_url}/v1/organizations/{organization}/metrics`
    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1/organizations/{}/metrics",
            self.api_url.as_str().trim_end_matches('/'),
            self.organization
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_discovery_records() {
        let targets: Vec<RawTarget> = serde_json::from_str(
            r#"[
                {"targets": ["db1.example.com:8080"], "labels": {"__metrics_path__": "status", "region": "us-east"}},
                {"targets": [], "labels": {}},
                {"labels": {"region": "eu-west"}},
                {"targets": null, "labels": null}
            ]"#,
        )
        .unwrap();

        assert_eq!(targets.len(), 4);
        assert_eq!(targets[0].endpoints, vec!["db1.example.com:8080"]);
        assert_eq!(targets[0].labels.get("region"), Some("us-east"));
        assert!(targets[1].endpoints.is_empty());
        assert!(targets[2].endpoints.is_empty());
        assert!(targets[3].labels.is_empty());
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let args = Arguments {
            api_url: Url::parse("http://127.0.0.1:1234/").unwrap(),
            organization: "acme".into(),
            credentials: Credentials {
                token_id: "id".into(),
                token_secret: "s".into(),
            },
            timeout: Duration::from_secs(1),
            tls_verify: true,
        };
        assert_eq!(
            args.endpoint(),
            "http://127.0.0.1:1234/v1/organizations/acme/metrics"
        );
    }
}
