//! Sharded blob storage for values above the inline threshold

mod paths;
mod store;

pub use paths::{BlobRef, BLOB_SUFFIX};
pub use store::BlobStore;
