//! Error handling for the cache
//!
//! Every error carries a recovery hint so callers can decide whether to
//! retry, reconfigure, or give up.

mod conversions;
mod display;
mod recovery;
mod types;

pub use types::*;
