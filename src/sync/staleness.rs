use chrono::{DateTime, Duration, Utc};

use crate::db::CacheMetadata;

/// Staleness is binary and per collection: a cache key is stale when it was
/// never touched, or when its last full sync is older than the max age.
/// System clock changes can flip this arbitrarily; not guarded against.
#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    max_age: Duration,
}

impl CachePolicy {
    pub fn new(max_age_minutes: u32) -> Self {
        Self {
            max_age: Duration::minutes(max_age_minutes as i64),
        }
    }

    pub fn is_stale(&self, metadata: Option<&CacheMetadata>, now: DateTime<Utc>) -> bool {
        match metadata {
            None => true,
            Some(meta) => now - meta.last_sync > self.max_age,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(last_sync: DateTime<Utc>) -> CacheMetadata {
        CacheMetadata {
            key: "apps".to_string(),
            last_sync,
            version: 1,
        }
    }

    #[test]
    fn missing_metadata_is_stale() {
        let policy = CachePolicy::new(30);
        assert!(policy.is_stale(None, Utc::now()));
    }

    #[test]
    fn recent_sync_is_fresh() {
        let policy = CachePolicy::new(30);
        let now = Utc::now();
        assert!(!policy.is_stale(Some(&meta(now - Duration::minutes(10))), now));
    }

    #[test]
    fn old_sync_is_stale() {
        let policy = CachePolicy::new(30);
        let now = Utc::now();
        assert!(policy.is_stale(Some(&meta(now - Duration::minutes(40))), now));
    }

    #[test]
    fn future_sync_reads_as_fresh() {
        // Clock went backwards; the policy takes the timestamps at face value.
        let policy = CachePolicy::new(30);
        let now = Utc::now();
        assert!(!policy.is_stale(Some(&meta(now + Duration::hours(2))), now));
    }
}
