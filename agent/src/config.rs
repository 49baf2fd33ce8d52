use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::Semaphore;
use url::Url;

use common::common::tags::Tags;
use common::error::{Error, Result};

use crate::metrics::config::{ScraperOptions, DEFAULT_TIMEOUT};

pub const DEFAULT_NAMESPACE: &str = "planetscale";
pub const DEFAULT_API_URL: &str = "https://api.planetscale.com";
pub const DEFAULT_REQUEST_CONCURRENCY: usize = 1;

/// A check configuration file: shared `init_config` plus one entry per instance.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckFile {
    #[serde(default, deserialize_with = "null_as_default")]
    pub init_config: InitConfig,
    #[serde(default)]
    pub instances: Vec<InstanceConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InitConfig {
    #[serde(default)]
    pub timeout: Option<f64>,
}

/// One instance as written by the operator. Validated into a [`BaseConfig`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstanceConfig {
    #[serde(default, alias = "organization_id")]
    pub planetscale_organization: Option<String>,
    #[serde(default, alias = "token_id")]
    pub ps_service_token_id: Option<String>,
    #[serde(default, alias = "token_secret")]
    pub ps_service_token_secret: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub timeout: Option<f64>,
    #[serde(default, alias = "max_concurrent_requests")]
    pub request_concurrency: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub emit_scrape_ok: bool,
    #[serde(flatten)]
    pub scraper: ScraperOptions,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token_id: String,
    pub token_secret: String,
}

impl Credentials {
    /// Value of the `Authorization` header expected by the PlanetScale API.
    pub fn authorization(&self) -> String {
        format!("{}:{}", self.token_id, self.token_secret)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token_id", &self.token_id)
            .field("token_secret", &"<redacted>")
            .finish()
    }
}

/// Validated, read-only configuration of one check instance.
#[derive(Debug, Clone)]
pub struct BaseConfig {
    pub organization: String,
    pub credentials: Credentials,
    pub namespace: String,
    pub api_url: Url,
    pub timeout: Duration,
    pub max_workers: usize,
    pub tags: Tags,
    pub emit_scrape_ok: bool,
    pub scraper: ScraperOptions,
}

impl BaseConfig {
    pub fn tls_verify(&self) -> bool {
        self.scraper.ssl_verify
    }
}

impl InstanceConfig {
    pub fn validate(self, init: &InitConfig) -> Result<BaseConfig> {
        let organization = required(self.planetscale_organization, "planetscale_organization")?;
        let token_id = required(self.ps_service_token_id, "ps_service_token_id")?;
        let token_secret = required(self.ps_service_token_secret, "ps_service_token_secret")?;

        let timeout_secs = self
            .timeout
            .or(init.timeout)
            .unwrap_or(DEFAULT_TIMEOUT.as_secs_f64());
        if !timeout_secs.is_finite() || timeout_secs <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "timeout must be a positive number of seconds, got {}",
                timeout_secs
            )));
        }
        let timeout = Duration::try_from_secs_f64(timeout_secs).map_err(|e| {
            Error::InvalidConfig(format!("timeout {} is out of range: {}", timeout_secs, e))
        })?;

        let max_workers = match self.request_concurrency {
            None => DEFAULT_REQUEST_CONCURRENCY,
            Some(n) if n >= 1 => usize::try_from(n)
                .ok()
                .filter(|&n| n <= Semaphore::MAX_PERMITS)
                .ok_or_else(|| {
                    Error::InvalidConfig(format!(
                        "request_concurrency must be at most {}, got {}",
                        Semaphore::MAX_PERMITS,
                        n
                    ))
                })?,
            Some(n) => {
                return Err(Error::InvalidConfig(format!(
                    "request_concurrency must be at least 1, got {}",
                    n
                )))
            }
        };

        let api_url = self.api_url.as_deref().unwrap_or(DEFAULT_API_URL);
        let api_url = Url::parse(api_url)
            .map_err(|e| Error::InvalidConfig(format!("invalid api_url {:?}: {}", api_url, e)))?;

        let namespace = self
            .namespace
            .filter(|ns| !ns.is_empty())
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

        let mut scraper = self.scraper;
        scraper.timeout = timeout;
        scraper.tag_by_endpoint = false;

        Ok(BaseConfig {
            organization,
            credentials: Credentials {
                token_id,
                token_secret,
            },
            namespace,
            api_url,
            timeout,
            max_workers,
            tags: self.tags.into_iter().collect(),
            emit_scrape_ok: self.emit_scrape_ok,
            scraper,
        })
    }
}

fn required(value: Option<String>, key: &'static str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::MissingConfig(key)),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
