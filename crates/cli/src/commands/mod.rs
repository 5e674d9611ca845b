use clap::Subcommand;
use hybridkv_cache::{AsyncCache, Cache};
use std::path::PathBuf;
use std::process::ExitCode;

mod entry;
mod maintenance;

#[derive(Subcommand)]
pub enum Commands {
    /// Store a value read from the argument, a file, or stdin
    Set {
        key: String,

        /// Value to store; stdin is read when neither this nor --file is given
        #[arg(conflicts_with = "file")]
        value: Option<String>,

        /// Read the value from a file
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,

        /// Time-to-live in seconds for this record
        #[arg(long, value_name = "SECS")]
        ttl: Option<f64>,
    },

    /// Write a stored value to stdout
    Get {
        key: String,

        /// Printed instead of failing when the key is absent
        #[arg(long, value_name = "VALUE")]
        default: Option<String>,
    },

    /// Print whether a key is a hit, stale, or a miss
    Has { key: String },

    /// Remove a key and its blob
    Del { key: String },

    /// Remove records stale for longer than the grace period
    Purge {
        /// Keep running, purging every SECS seconds until interrupted
        #[arg(long, value_name = "SECS")]
        every: Option<f64>,
    },

    /// Print record counts and the effective configuration as JSON
    Stats,

    /// Delete the persisted metadata store
    Destroy,
}

impl Commands {
    pub async fn execute(self, cache: Cache) -> anyhow::Result<ExitCode> {
        let cache = AsyncCache::new(cache);
        match self {
            Commands::Set {
                key,
                value,
                file,
                ttl,
            } => entry::set(&cache, key, value, file, ttl).await,
            Commands::Get { key, default } => entry::get(&cache, key, default).await,
            Commands::Has { key } => entry::has(&cache, key).await,
            Commands::Del { key } => entry::del(&cache, key).await,
            Commands::Purge { every } => maintenance::purge(&cache, every).await,
            Commands::Stats => maintenance::stats(&cache).await,
            Commands::Destroy => maintenance::destroy(&cache).await,
        }
    }
}
