use std::fs;
use std::panic;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use log::{error, info, LevelFilter};
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Config;
use prometheus::{Encoder, Registry, TextEncoder};

use planetscale_agent::appender::LogAppender;
use planetscale_agent::check::PlanetscaleCheck;
use planetscale_agent::common::component::Component;
use planetscale_agent::common::registry::Options;
use planetscale_agent::config::CheckFile;
use planetscale_agent::health::LogSink;
use planetscale_agent::metrics::Metrics;
use planetscale_agent::scrape::openmetrics::OpenMetricsScraperFactory;

#[derive(Debug, Parser)]
#[command(about = "Scrapes the metrics endpoints of PlanetScale organizations")]
struct Args {
    /// Check configuration with `init_config` and `instances`.
    #[arg(short, long, default_value = "conf.yaml")]
    config: PathBuf,
    /// Seconds between runs. Runs once when unset.
    #[arg(short, long)]
    interval: Option<u64>,
    /// Run a single cycle and exit, even when `--interval` is set.
    #[arg(long)]
    once: bool,
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
    /// Print the check's own metrics in text format after every run.
    #[arg(long)]
    print_metrics: bool,
}

impl Args {
    /// Delay before the next cycle, or `None` to stop after the current one.
    fn next_delay(&self) -> Option<Duration> {
        if self.once {
            return None;
        }
        self.interval.map(|secs| Duration::from_secs(secs.max(1)))
    }
}

fn init_logging(level: LevelFilter) -> anyhow::Result<()> {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{d(%Y-%m-%dT%H:%M:%S%.3f)} {l} {t} - {m}{n}")))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level))?;
    log4rs::init_config(config)?;

    panic::set_hook(Box::new(|panic_info| {
        error!("{}", panic_info);
    }));
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_level)?;

    let raw = fs::read_to_string(&args.config)
        .with_context(|| format!("failed to read {}", args.config.display()))?;
    let file: CheckFile = serde_yaml::from_str(&raw)
        .with_context(|| format!("failed to parse {}", args.config.display()))?;
    if file.instances.is_empty() {
        anyhow::bail!("{} has no instances", args.config.display());
    }

    let registry = Registry::new();
    let options = Options {
        id: "planetscale".to_string(),
        scrapers: Arc::new(OpenMetricsScraperFactory::new(Arc::new(LogAppender))),
        service_checks: Arc::new(LogSink),
        metrics: Arc::new(Metrics::new(&registry)?),
    };

    let mut checks: Vec<Box<dyn Component>> = Vec::with_capacity(file.instances.len());
    for (i, instance) in file.instances.into_iter().enumerate() {
        let check = PlanetscaleCheck::new(options.with_id(format!("planetscale:{}", i)), instance, &file.init_config)
            .with_context(|| format!("instance {} is misconfigured", i))?;
        checks.push(Box::new(check));
    }

    info!("Server started");
    loop {
        for check in &checks {
            let summary = check.run().await;
            info!(
                "{}: discovered {} targets, skipped {}, scraped {} ok, {} failed",
                check.id(),
                summary.discovered,
                summary.skipped,
                summary.succeeded,
                summary.failed
            );
        }
        if args.print_metrics {
            let mut buf = Vec::new();
            TextEncoder::new().encode(&registry.gather(), &mut buf)?;
            print!("{}", String::from_utf8_lossy(&buf));
        }
        match args.next_delay() {
            Some(delay) => tokio::time::sleep(delay).await,
            None => break,
        }
    }
    info!("Server stopped");
    Ok(())
}
