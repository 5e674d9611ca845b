//! The cache: placement, freshness, eviction and purge behind one handle
//!
//! - `set` places the value (inline or blob), upserts its record and, when a
//!   bound is configured, evicts least-recently-used entries in the same
//!   metadata transaction
//! - `get` returns stored bytes regardless of freshness
//! - `has` reports hit/stale/miss without side effects
//! - `purge` removes records past TTL plus grace, their blobs and any blob
//!   directories left empty

mod builder;
mod operations;
mod types;

pub use types::Cache;

#[cfg(test)]
mod tests;
