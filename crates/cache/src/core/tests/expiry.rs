//! TTL, grace period and purge tests

use super::{harness, GRACE, TTL};
use crate::errors::Result;
use crate::record::Freshness;
use std::time::Duration;

#[test]
fn test_freshness_lifecycle() -> Result<()> {
    let h = harness(|b| b);
    assert_eq!(h.cache.has("k")?, Freshness::Miss);

    h.cache.set("k", b"value")?;
    assert_eq!(h.cache.has("k")?, Freshness::Hit);

    h.tick(TTL.as_secs_f64());
    assert_eq!(h.cache.has("k")?, Freshness::Stale);

    // Stale values stay readable and purge leaves them alone within the grace window
    assert_eq!(h.cache.get("k")?, Some(b"value".to_vec()));
    assert_eq!(h.cache.purge()?, 0);

    h.tick(GRACE.as_secs_f64() + 1.0);
    assert_eq!(h.cache.has("k")?, Freshness::Stale);
    assert_eq!(h.cache.purge()?, 1);
    assert_eq!(h.cache.has("k")?, Freshness::Miss);
    assert_eq!(h.cache.get_or("k", b"default".to_vec())?, b"default");
    Ok(())
}

#[test]
fn test_has_does_not_touch() -> Result<()> {
    let h = harness(|b| b.with_max_entries(2));
    h.cache.set("a", b"1")?;
    h.tick(1.0);
    h.cache.set("b", b"2")?;
    h.tick(1.0);

    // Checking "a" must not save it from eviction
    assert_eq!(h.cache.has("a")?, Freshness::Hit);
    h.cache.set("c", b"3")?;

    assert_eq!(h.cache.has("a")?, Freshness::Miss);
    assert_eq!(h.cache.has("b")?, Freshness::Hit);
    Ok(())
}

#[test]
fn test_fresh_len_excludes_stale() -> Result<()> {
    let h = harness(|b| b);
    h.cache.set("fresh", b"v")?;
    h.cache.set_with_ttl("stale", b"v", Some(Duration::from_secs(1)))?;
    assert_eq!(h.cache.fresh_len()?, 2);

    h.tick(1.0);
    assert_eq!(h.cache.fresh_len()?, 1);
    assert_eq!(h.cache.len()?, 2);
    Ok(())
}

#[test]
fn test_explicit_ttl_overrides_default() -> Result<()> {
    let h = harness(|b| b);
    h.cache.set_with_ttl("short", b"v", Some(Duration::from_secs(5)))?;
    h.cache.set("default", b"v")?;

    h.tick(6.0);
    assert_eq!(h.cache.has("short")?, Freshness::Stale);
    assert_eq!(h.cache.has("default")?, Freshness::Hit);
    Ok(())
}

#[test]
fn test_zero_ttl_is_immediately_stale() -> Result<()> {
    let h = harness(|b| b);
    h.cache.set_with_ttl("k", b"v", Some(Duration::ZERO))?;
    assert_eq!(h.cache.has("k")?, Freshness::Stale);
    assert_eq!(h.cache.get("k")?, Some(b"v".to_vec()));
    assert_eq!(h.cache.stats().stale_hits, 1);
    Ok(())
}

#[test]
fn test_purge_counts_only_past_grace() -> Result<()> {
    let h = harness(|b| b);
    h.cache.set_with_ttl("old-1", b"v", Some(Duration::from_secs(1)))?;
    h.cache.set_with_ttl("old-2", &[1u8; 50], Some(Duration::from_secs(1)))?;
    h.cache.set_with_ttl("stale-in-grace", b"v", Some(Duration::from_secs(40)))?;
    h.cache.set_with_ttl("fresh", b"v", Some(Duration::from_secs(1000)))?;

    // now = t0 + 50: old-* expired 49s ago (> 30s grace), stale-in-grace 10s ago
    h.tick(50.0);
    let report = h.cache.purge_report()?;
    assert_eq!(report.records, 2);
    assert_eq!(report.blobs_removed, 1);

    assert_eq!(h.cache.has("old-1")?, Freshness::Miss);
    assert_eq!(h.cache.has("old-2")?, Freshness::Miss);
    assert!(!h.blob_path("old-2").exists());
    assert_eq!(h.cache.has("stale-in-grace")?, Freshness::Stale);
    assert_eq!(h.cache.has("fresh")?, Freshness::Hit);

    // Nothing new expired
    assert_eq!(h.cache.purge()?, 0);
    assert_eq!(h.cache.stats().purged, 2);
    Ok(())
}

#[test]
fn test_purge_at_exact_grace_boundary_keeps_record() -> Result<()> {
    let h = harness(|b| b);
    h.cache.set("k", b"v")?;

    // expire_at == now - grace is not strictly before the cutoff
    h.tick((TTL + GRACE).as_secs_f64());
    assert_eq!(h.cache.purge()?, 0);

    h.tick(0.5);
    assert_eq!(h.cache.purge()?, 1);
    Ok(())
}

#[test]
fn test_purge_reclaims_empty_blob_directories() -> Result<()> {
    let h = harness(|b| b);
    h.cache.set("big", &[7u8; 4096])?;
    let shard = h.blob_path("big").parent().unwrap().parent().unwrap().to_path_buf();
    assert!(shard.exists());

    h.tick((TTL + GRACE).as_secs_f64() + 1.0);
    let report = h.cache.purge_report()?;
    assert_eq!(report.records, 1);
    assert_eq!(report.dirs_removed, 2);
    assert!(!shard.exists());
    assert!(h.dir.path().join("blobs").exists());
    Ok(())
}

#[test]
fn test_purge_swallows_already_missing_blob() -> Result<()> {
    let h = harness(|b| b);
    h.cache.set("big", &[7u8; 4096])?;
    std::fs::remove_file(h.blob_path("big")).unwrap();

    h.tick((TTL + GRACE).as_secs_f64() + 1.0);
    let report = h.cache.purge_report()?;
    assert_eq!(report.records, 1);
    assert_eq!(report.blobs_removed, 0);
    assert_eq!(report.cleanup_errors, 0);
    Ok(())
}

#[test]
fn test_concrete_scenario() -> Result<()> {
    let h = harness(|b| b);

    h.cache.set("a", &[1u8; 5])?;
    h.cache.set("b", &[2u8; 20])?;
    assert!(!h.cache.is_blob_backed("a")?);
    assert!(h.cache.is_blob_backed("b")?);
    assert!(h.blob_path("b").exists());
    assert_eq!(h.cache.has("a")?, Freshness::Hit);

    h.tick(TTL.as_secs_f64() + 1.0);
    assert_eq!(h.cache.has("a")?, Freshness::Stale);

    // Keep "b" alive so only "a" is old enough to purge
    h.cache.set("b", &[2u8; 20])?;
    h.tick(GRACE.as_secs_f64());
    assert_eq!(h.cache.purge()?, 1);
    assert_eq!(h.cache.has("a")?, Freshness::Miss);
    assert_eq!(h.cache.has("b")?, Freshness::Hit);
    Ok(())
}
