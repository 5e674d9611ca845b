use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use hybridkv_cache::{Cache, CacheConfigBuilder, CacheConfigLoader, MetadataLocation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

use commands::Commands;

#[derive(Parser)]
#[command(name = "hybridkv")]
#[command(about = "Key-value cache with inline and blob-backed storage", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding blob files
    #[arg(long, global = true, value_name = "DIR")]
    blob_root: Option<PathBuf>,

    /// Metadata store: a file path, ":memory:", or "" for a transient store
    #[arg(long, global = true, value_name = "LOCATION")]
    metadata: Option<String>,

    /// Default time-to-live in seconds
    #[arg(long = "default-ttl", global = true, value_name = "SECS")]
    default_ttl: Option<f64>,

    /// Seconds a stale record is kept before purge removes it
    #[arg(long, global = true, value_name = "SECS")]
    grace: Option<f64>,

    /// Largest value, in bytes, stored inline in the metadata store
    #[arg(long, global = true, value_name = "BYTES")]
    inline_threshold: Option<usize>,

    /// Maximum number of unexpired records (0 disables eviction)
    #[arg(long, global = true, value_name = "COUNT")]
    max_entries: Option<usize>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn open_cache(&self) -> anyhow::Result<Cache> {
        let (config, sources) = CacheConfigLoader::load().context("Failed to load configuration")?;
        tracing::debug!("Configuration sources: {:?}", sources);

        let mut builder = CacheConfigBuilder::from_config(config);
        if let Some(blob_root) = &self.blob_root {
            builder = builder.with_blob_root(blob_root.clone());
        }
        if let Some(metadata) = &self.metadata {
            builder = builder.with_metadata(MetadataLocation::from(metadata.as_str()));
        }
        if let Some(ttl) = self.default_ttl {
            builder = builder.with_default_ttl(seconds(ttl, "--default-ttl")?);
        }
        if let Some(grace) = self.grace {
            builder = builder.with_grace_period(seconds(grace, "--grace")?);
        }
        if let Some(threshold) = self.inline_threshold {
            builder = builder.with_inline_threshold(threshold);
        }
        if let Some(max_entries) = self.max_entries {
            builder = builder.with_max_entries(max_entries);
        }

        Cache::open(builder.build()).context("Failed to open cache")
    }
}

/// Parse a non-negative number of seconds given on the command line
pub(crate) fn seconds(value: f64, flag: &str) -> anyhow::Result<Duration> {
    Duration::try_from_secs_f64(value)
        .map_err(|_| anyhow::anyhow!("{flag} must be a non-negative number of seconds, got {value}"))
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_level(true)
                .with_target(true),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let cache = cli.open_cache()?;
    cli.command.execute(cache).await
}
