use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};

use common::error::Result;

use crate::common::component::Component;
use crate::common::registry::Options;
use crate::config::{BaseConfig, InitConfig, InstanceConfig};
use crate::discover::{Arguments, PlanetscaleDiscovery};
use crate::health::HealthReporter;
use crate::metrics::Metrics;
use crate::scrape::target::configs_from_targets;
use crate::scrape::{Executor, Manager, RunSummary};

/// Discovers an organization's metrics endpoints and scrapes all of them.
pub struct PlanetscaleCheck {
    id: String,
    config: Arc<BaseConfig>,
    discovery: PlanetscaleDiscovery,
    manager: Manager,
    reporter: HealthReporter,
    metrics: Arc<Metrics>,
}

impl PlanetscaleCheck {
    /// Validates the instance. Configuration problems surface here, before any request.
    pub fn new(opts: Options, instance: InstanceConfig, init: &InitConfig) -> Result<Self> {
        let config = Arc::new(instance.validate(init)?);
        let discovery = PlanetscaleDiscovery::new(Arguments::from_config(&config))?;
        let reporter = HealthReporter::new(opts.service_checks, config.namespace.clone());
        let executor = Executor::new(
            opts.scrapers,
            reporter.clone(),
            opts.metrics.clone(),
            config.organization.clone(),
            config.emit_scrape_ok,
        );

        info!(
            "configured check {} for organization {} at {} (concurrency {})",
            opts.id,
            config.organization,
            discovery.url(),
            config.max_workers
        );
        Ok(PlanetscaleCheck {
            id: opts.id,
            manager: Manager::new(executor, config.max_workers),
            config,
            discovery,
            reporter,
            metrics: opts.metrics,
        })
    }

    pub fn config(&self) -> &BaseConfig {
        &self.config
    }

    pub async fn run(&self) -> RunSummary {
        let targets = self.discovery.resolve(&self.reporter, &self.metrics).await;
        let configs = configs_from_targets(&targets, &self.config);
        let skipped = targets.len() - configs.len();
        debug!(
            "{}: {} targets discovered, {} skipped",
            self.id,
            targets.len(),
            skipped
        );

        let summary = self.manager.run(configs).await;
        RunSummary {
            discovered: targets.len(),
            skipped,
            ..summary
        }
    }
}

#[async_trait]
impl Component for PlanetscaleCheck {
    fn id(&self) -> &str {
        &self.id
    }

    async fn run(&self) -> RunSummary {
        PlanetscaleCheck::run(self).await
    }
}
