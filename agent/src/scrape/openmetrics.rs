use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Certificate, Identity};

use crate::appender::{Appender, RawExposition};
use crate::common::error_chain;
use crate::metrics::config::ScraperOptions;
use crate::scrape::scrape::{Scraper, ScraperFactory};
use crate::scrape::target::ScrapeConfig;
use crate::scrape::ScrapeError;

pub const OPENMETRICS_ACCEPT: &str = "application/openmetrics-text;version=1.0.0,application/openmetrics-text;version=0.0.1;q=0.75,text/plain;version=0.0.4;q=0.5,*/*;q=0.1";

/// Creates [`OpenMetricsScraper`]s that hand their payload to `appender`.
pub struct OpenMetricsScraperFactory {
    appender: Arc<dyn Appender>,
}

impl OpenMetricsScraperFactory {
    pub fn new(appender: Arc<dyn Appender>) -> Self {
        Self { appender }
    }
}

impl ScraperFactory for OpenMetricsScraperFactory {
    fn create(&self, config: ScrapeConfig) -> Result<Box<dyn Scraper>, ScrapeError> {
        let client = client_from_options(&config.options).map_err(|message| ScrapeError::Setup {
            endpoint: config.endpoint_url.clone(),
            message,
        })?;
        Ok(Box::new(OpenMetricsScraper {
            client,
            config,
            appender: Arc::clone(&self.appender),
        }))
    }
}

pub struct OpenMetricsScraper {
    client: reqwest::Client,
    config: ScrapeConfig,
    appender: Arc<dyn Appender>,
}

#[async_trait]
impl Scraper for OpenMetricsScraper {
    async fn scrape(&self) -> Result<(), ScrapeError> {
        let endpoint = &self.config.endpoint_url;
        let response = self
            .client
            .get(endpoint)
            .header(ACCEPT, OPENMETRICS_ACCEPT)
            .send()
            .await
            .map_err(|e| classify(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Http {
                endpoint: endpoint.clone(),
                status: status.as_u16(),
            });
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(|e| classify(endpoint, e))?;
        debug!("fetched {} bytes from {}", body.len(), endpoint);

        self.appender
            .append(RawExposition {
                namespace: self.config.namespace.clone(),
                endpoint: endpoint.clone(),
                tags: self.config.tags.clone(),
                content_type,
                body,
                options: self.config.options.clone(),
            })
            .map_err(|e| ScrapeError::Submit {
                endpoint: endpoint.clone(),
                message: format!("{:#}", e),
            })
    }
}

fn classify(endpoint: &str, err: reqwest::Error) -> ScrapeError {
    let endpoint = endpoint.to_string();
    let message = error_chain(&err);
    if err.is_timeout() {
        ScrapeError::Timeout { endpoint, message }
    } else {
        ScrapeError::Transport { endpoint, message }
    }
}

fn client_from_options(options: &ScraperOptions) -> Result<reqwest::Client, String> {
    let mut builder = reqwest::Client::builder()
        .timeout(options.timeout)
        .danger_accept_invalid_certs(!options.ssl_verify);

    if let Some(ca) = &options.ssl_ca_cert {
        let pem = read_pem(ca)?;
        let cert = Certificate::from_pem(&pem)
            .map_err(|e| format!("invalid ssl_ca_cert {}: {}", ca.display(), e))?;
        builder = builder.add_root_certificate(cert);
    }

    match (&options.ssl_cert, &options.ssl_private_key) {
        (Some(cert), key) => {
            let cert_pem = read_pem(cert)?;
            // Without a separate key the certificate file must hold both.
            let key_pem = match key {
                Some(key) => read_pem(key)?,
                None => cert_pem.clone(),
            };
            let identity = Identity::from_pkcs8_pem(&cert_pem, &key_pem)
                .map_err(|e| format!("invalid client certificate {}: {}", cert.display(), e))?;
            builder = builder.identity(identity);
        }
        (None, Some(_)) => return Err("ssl_private_key is set without ssl_cert".to_string()),
        (None, None) => {}
    }

    builder
        .build()
        .map_err(|e| format!("failed to build HTTP client: {}", e))
}

fn read_pem(path: &Path) -> Result<Vec<u8>, String> {
    fs::read(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))
}
