use hybridkv_cache::{AsyncCache, PurgeScheduler};
use std::process::ExitCode;

use crate::seconds;

pub async fn purge(cache: &AsyncCache, every: Option<f64>) -> anyhow::Result<ExitCode> {
    let Some(every) = every else {
        let report = cache.purge_report().await?;
        println!("{}", serde_json::to_string(&report)?);
        return Ok(ExitCode::SUCCESS);
    };

    let interval = seconds(every, "--every")?;
    if interval.is_zero() {
        anyhow::bail!("--every must be greater than zero");
    }

    let mut scheduler = PurgeScheduler::start(cache.inner().clone(), interval);
    tracing::info!("Purging every {:?}, press Ctrl-C to stop", interval);

    loop {
        tokio::select! {
            report = scheduler.next_report() => match report {
                Some(report) => println!("{}", serde_json::to_string(&report)?),
                None => anyhow::bail!("Purge scheduler stopped unexpectedly"),
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Stopping purge scheduler");
                scheduler.stop();
                return Ok(ExitCode::SUCCESS);
            }
        }
    }
}

pub async fn stats(cache: &AsyncCache) -> anyhow::Result<ExitCode> {
    let entries = cache.len().await?;
    let fresh = cache.fresh_len().await?;
    let inner = cache.inner();
    let config = inner.config();

    let output = serde_json::json!({
        "entries": entries,
        "fresh_entries": fresh,
        "stale_entries": entries.saturating_sub(fresh),
        "blob_root": inner.blob_root(),
        "metadata": inner.metadata_location().to_string(),
        "inline_threshold": config.inline_threshold,
        "max_entries": config.max_entries,
        "default_ttl_secs": config.default_ttl.as_secs_f64(),
        "grace_period_secs": config.grace_period.as_secs_f64(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(ExitCode::SUCCESS)
}

pub async fn destroy(cache: &AsyncCache) -> anyhow::Result<ExitCode> {
    cache.destroy().await?;
    tracing::info!("Destroyed metadata at {}", cache.inner().metadata_location());
    Ok(ExitCode::SUCCESS)
}
