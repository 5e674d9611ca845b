//! Metadata store: the authoritative record of which keys exist
//!
//! Backed by SQLite with two secondary orderings, by expiry time and by last
//! access time, so eviction and purge scans cost proportional to their result
//! rather than to the whole table.

mod records;
mod schema;
mod store;

pub use records::Records;
pub use schema::SCHEMA_VERSION;
pub use store::MetadataStore;
