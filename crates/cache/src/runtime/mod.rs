//! Tokio integration: an async facade over [`Cache`](crate::Cache) and a
//! periodic purge task.

mod async_cache;
mod scheduler;

pub use async_cache::AsyncCache;
pub use scheduler::PurgeScheduler;
