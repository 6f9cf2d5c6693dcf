use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use chrono::{DateTime, Duration, Utc};

pub const DEFAULT_TTL_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// In-memory key/value store where every entry lives for the same TTL.
///
/// Clones share the same storage. Expired entries read as absent; they are
/// only dropped from memory by [`TtlCache::purge_expired`], `delete` or
/// `flush_all`.
#[derive(Debug, Clone)]
pub struct TtlCache<V> {
    inner: Arc<RwLock<HashMap<String, CacheEntry<V>>>>,
    ttl: Duration,
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_TTL_SECS))
    }
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let now = Utc::now();
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .and_then(|entry| {
                if entry.is_expired(now) {
                    None
                } else {
                    Some(entry.value.clone())
                }
            })
    }

    /// Stores `value` under `key`, replacing any previous entry and restarting
    /// its TTL.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let entry = CacheEntry {
            value,
            expires_at: Utc::now() + self.ttl,
        };
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), entry);
    }

    /// Returns the number of entries removed.
    pub fn delete(&self, key: &str) -> usize {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .map_or(0, |_| 1)
    }

    pub fn flush_all(&self) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let before = map.len();
        map.retain(|_, entry| !entry.is_expired(now));
        before - map.len()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Utc::now();
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn short_lived() -> TtlCache<String> {
        TtlCache::new(Duration::milliseconds(30))
    }

    #[test]
    fn test_default_ttl_is_one_day() {
        let cache = TtlCache::<String>::default();
        assert_eq!(cache.ttl(), Duration::seconds(86400));
    }

    #[test]
    fn test_set_then_get() {
        let cache = TtlCache::<String>::default();
        assert_eq!(cache.get("id1"), None);
        cache.set("id1", "first".to_string());
        assert_eq!(cache.get("id1"), Some("first".to_string()));
        cache.set("id1", "second".to_string());
        assert_eq!(cache.get("id1"), Some("second".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_delete_reports_count() {
        let cache = TtlCache::<String>::default();
        cache.set("id1", "value".to_string());
        assert_eq!(cache.delete("id1"), 1);
        assert_eq!(cache.delete("id1"), 0);
        assert_eq!(cache.get("id1"), None);
    }

    #[test]
    fn test_flush_all() {
        let cache = TtlCache::<String>::default();
        cache.set("a", "1".to_string());
        cache.set("b", "2".to_string());
        cache.flush_all();
        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_expired_entry_reads_absent_before_purge() {
        let cache = short_lived();
        cache.set("id1", "value".to_string());
        assert!(cache.get("id1").is_some());

        sleep(std::time::Duration::from_millis(60));

        assert_eq!(cache.get("id1"), None);
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.purge_expired(), 0);
    }

    #[test]
    fn test_purge_keeps_live_entries() {
        let cache = short_lived();
        cache.set("old", "value".to_string());
        sleep(std::time::Duration::from_millis(60));
        cache.set("fresh", "value".to_string());

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.get("fresh"), Some("value".to_string()));
    }

    #[test]
    fn test_clones_share_storage() {
        let cache = TtlCache::<String>::default();
        let handle = cache.clone();
        handle.set("id1", "value".to_string());
        assert_eq!(cache.get("id1"), Some("value".to_string()));
    }
}
