//! Freshness evaluation

use crate::record::{CacheRecord, Freshness};

/// Classify a record against the current time.
///
/// Pure: reading freshness never touches access times, eviction or purge.
pub fn evaluate(record: Option<&CacheRecord>, now: f64) -> Freshness {
    match record {
        None => Freshness::Miss,
        Some(record) if record.expire_at > now => Freshness::Hit,
        Some(_) => Freshness::Stale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Storage;

    fn record(expire_at: f64) -> CacheRecord {
        CacheRecord {
            key: "k".to_string(),
            storage: Storage::Inline(vec![1, 2, 3]),
            expire_at,
            last_access_at: 0.0,
        }
    }

    #[test]
    fn test_absent_record_is_miss() {
        assert_eq!(evaluate(None, 10.0), Freshness::Miss);
    }

    #[test]
    fn test_future_expiry_is_hit() {
        assert_eq!(evaluate(Some(&record(10.5)), 10.0), Freshness::Hit);
    }

    #[test]
    fn test_expiry_boundary_is_stale() {
        // expire_at == now is no longer fresh
        assert_eq!(evaluate(Some(&record(10.0)), 10.0), Freshness::Stale);
        assert_eq!(evaluate(Some(&record(9.0)), 10.0), Freshness::Stale);
    }
}
