use log::{debug, error};
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION};

use common::common::tags::Tags;
use common::error::{Error, Result};

use crate::common::error_chain;
use crate::discover::discover::{Arguments, RawTarget};
use crate::discover::DiscoveryError;
use crate::health::{HealthReporter, Status};
use crate::metrics::Metrics;

/// Lists the scrape targets of one PlanetScale organization.
pub struct PlanetscaleDiscovery {
    client: reqwest::Client,
    url: String,
    organization: String,
    authorization: HeaderValue,
}

impl PlanetscaleDiscovery {
    pub fn new(args: Arguments) -> Result<PlanetscaleDiscovery> {
        let mut authorization = HeaderValue::from_str(&args.credentials.authorization())
            .map_err(|_| Error::InvalidConfig("service token contains invalid header characters".into()))?;
        authorization.set_sensitive(true);

        let client = reqwest::Client::builder()
            .timeout(args.timeout)
            .danger_accept_invalid_certs(!args.tls_verify)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to build HTTP client: {}", e)))?;

        Ok(PlanetscaleDiscovery {
            client,
            url: args.endpoint(),
            organization: args.organization,
            authorization,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issues the discovery request and decodes the target list.
    pub async fn refresh(&self) -> Result<Vec<RawTarget>, DiscoveryError> {
        debug!("querying PlanetScale API: {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, self.authorization.clone())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::Http {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        let targets: Vec<RawTarget> =
            serde_json::from_slice(&body).map_err(|e| DiscoveryError::Decode {
                url: self.url.clone(),
                message: e.to_string(),
            })?;
        debug!("received {} targets from PlanetScale API", targets.len());
        Ok(targets)
    }

    /// Runs [`refresh`](Self::refresh) and reports the outcome as the
    /// `api.can_connect` service check. Failures yield an empty target list.
    pub async fn resolve(&self, reporter: &HealthReporter, metrics: &Metrics) -> Vec<RawTarget> {
        let tags = Tags::from_iter([format!("planetscale_org:{}", self.organization)]);
        match self.refresh().await {
            Ok(targets) => {
                metrics
                    .discovery_requests
                    .with_label_values(&[self.organization.as_str(), "ok"])
                    .inc();
                metrics
                    .discovered_targets
                    .with_label_values(&[self.organization.as_str()])
                    .set(targets.len() as i64);
                reporter.api_can_connect(Status::Ok, None, tags);
                targets
            }
            Err(err) => {
                error!("error querying PlanetScale API: {}", err);
                metrics
                    .discovery_requests
                    .with_label_values(&[self.organization.as_str(), err.kind()])
                    .inc();
                metrics
                    .discovered_targets
                    .with_label_values(&[self.organization.as_str()])
                    .set(0);
                reporter.api_can_connect(Status::Critical, Some(err.to_string()), tags);
                Vec::new()
            }
        }
    }

    fn classify(&self, err: reqwest::Error) -> DiscoveryError {
        let url = self.url.clone();
        let message = error_chain(&err);
        if err.is_timeout() {
            DiscoveryError::Timeout { url, message }
        } else if err.is_decode() {
            DiscoveryError::Decode { url, message }
        } else {
            DiscoveryError::Transport { url, message }
        }
    }
}
