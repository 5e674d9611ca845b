use anyhow::Context;
use hybridkv_cache::AsyncCache;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::seconds;

pub async fn set(
    cache: &AsyncCache,
    key: String,
    value: Option<String>,
    file: Option<PathBuf>,
    ttl: Option<f64>,
) -> anyhow::Result<ExitCode> {
    let bytes = match (value, file) {
        (Some(value), _) => value.into_bytes(),
        (None, Some(path)) => {
            std::fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?
        }
        (None, None) => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read value from stdin")?;
            buf
        }
    };
    let ttl = ttl.map(|ttl| seconds(ttl, "--ttl")).transpose()?;

    let len = bytes.len();
    cache.set_with_ttl(key.clone(), bytes, ttl).await?;
    tracing::info!("Stored {} bytes under '{}'", len, key);
    Ok(ExitCode::SUCCESS)
}

pub async fn get(
    cache: &AsyncCache,
    key: String,
    default: Option<String>,
) -> anyhow::Result<ExitCode> {
    let value = match (cache.get(key.clone()).await?, default) {
        (Some(value), _) => value,
        (None, Some(default)) => default.into_bytes(),
        (None, None) => {
            eprintln!("hybridkv: no value for '{key}'");
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&value)?;
    stdout.flush()?;
    Ok(ExitCode::SUCCESS)
}

pub async fn has(cache: &AsyncCache, key: String) -> anyhow::Result<ExitCode> {
    println!("{}", cache.has(key).await?);
    Ok(ExitCode::SUCCESS)
}

pub async fn del(cache: &AsyncCache, key: String) -> anyhow::Result<ExitCode> {
    let removed = cache.del(key.clone()).await?;
    if removed {
        tracing::info!("Removed '{}'", key);
    } else {
        tracing::info!("Nothing stored under '{}'", key);
    }
    Ok(ExitCode::SUCCESS)
}
