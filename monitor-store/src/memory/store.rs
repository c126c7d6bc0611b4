use std::time::Duration;

use ahash::HashMap;
use parking_lot::Mutex;
use tokio::time::Instant;

#[derive(Debug)]
struct Value {
    data: String,
    expires_at: Option<Instant>,
}

impl Value {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

#[derive(Debug, Default)]
struct Inner {
    values: HashMap<String, Value>,
    sorted_sets: HashMap<String, HashMap<String, i64>>,
}

/// Process local dataset with the subset of store semantics the monitor relies
/// on: expiring string keys and score ordered sets.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: &str, value: &str) {
        self.insert(key, value, None);
    }

    pub fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) {
        self.insert(key, value, Some(Instant::now() + ttl));
    }

    fn insert(&self, key: &str, value: &str, expires_at: Option<Instant>) {
        let value = Value { data: value.to_string(), expires_at };
        self.inner.lock().values.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let mut inner = self.inner.lock();
        let expired = inner.values.get(key)?.is_expired(Instant::now());
        if expired {
            inner.values.remove(key);
            return None;
        }
        inner.values.get(key).map(|value| value.data.clone())
    }

    pub fn delete(&self, key: &str) -> bool {
        let mut inner = self.inner.lock();
        let now = Instant::now();
        match inner.values.remove(key) {
            Some(value) => !value.is_expired(now),
            None => inner.sorted_sets.remove(key).is_some(),
        }
    }

    /// Remaining time to live of `key`, `None` when absent or persistent.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let inner = self.inner.lock();
        let now = Instant::now();
        inner.values
            .get(key)
            .filter(|value| !value.is_expired(now))
            .and_then(|value| value.expires_at)
            .map(|expires_at| expires_at - now)
    }

    pub fn add_to_sorted_set(&self, key: &str, member: &str, score: i64) {
        self.inner.lock()
            .sorted_sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string(), score);
    }

    pub fn score(&self, key: &str, member: &str) -> Option<i64> {
        self.inner.lock()
            .sorted_sets
            .get(key)
            .and_then(|set| set.get(member).copied())
    }

    pub fn sorted_set_len(&self, key: &str) -> usize {
        self.inner.lock().sorted_sets.get(key).map(|set| set.len()).unwrap_or(0)
    }

    pub fn range_by_score(&self, key: &str, min: i64, max: Option<i64>) -> Vec<String> {
        let inner = self.inner.lock();
        let Some(set) = inner.sorted_sets.get(key) else {
            return Vec::new();
        };
        let mut members: Vec<(&String, i64)> = set
            .iter()
            .filter(|(_, score)| **score >= min && max.map_or(true, |max| **score <= max))
            .map(|(member, score)| (member, *score))
            .collect();
        members.sort_by(|(a_member, a_score), (b_member, b_score)| {
            a_score.cmp(b_score).then_with(|| a_member.cmp(b_member))
        });
        members.into_iter().map(|(member, _)| member.clone()).collect()
    }

    pub fn remove_range_by_score(&self, key: &str, max: i64) -> u64 {
        let mut inner = self.inner.lock();
        let Some(set) = inner.sorted_sets.get_mut(key) else {
            return 0;
        };
        let before = set.len();
        set.retain(|_, score| *score >= max);
        (before - set.len()) as u64
    }

    pub fn multi_get(&self, keys: &[String]) -> Vec<Option<String>> {
        keys.iter().map(|key| self.get(key)).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use monitor_core::ext::duration_ext::DurationExt;

    use crate::memory::store::MemoryStore;

    #[test]
    fn test_range_by_score_is_inclusive_and_ordered() {
        let store = MemoryStore::new();
        let now = 1_000_000;
        store.add_to_sorted_set("reg:dev", "A", now + 5000);
        store.add_to_sorted_set("reg:dev", "B", now - 100);
        store.add_to_sorted_set("reg:dev", "C", now);
        store.add_to_sorted_set("reg:dev", "D", now + 10);
        assert_eq!(store.range_by_score("reg:dev", now, None), vec!["C", "D", "A"]);
        assert_eq!(store.range_by_score("reg:dev", now, Some(now + 10)), vec!["C", "D"]);
        assert!(store.range_by_score("reg:missing", now, None).is_empty());
    }

    #[test]
    fn test_readd_replaces_score() {
        let store = MemoryStore::new();
        store.add_to_sorted_set("reg:dev", "A", 10);
        store.add_to_sorted_set("reg:dev", "A", 20);
        assert_eq!(store.score("reg:dev", "A"), Some(20));
        assert_eq!(store.sorted_set_len("reg:dev"), 1);
    }

    #[test]
    fn test_remove_range_by_score() {
        let store = MemoryStore::new();
        store.add_to_sorted_set("reg:dev", "old", 10);
        store.add_to_sorted_set("reg:dev", "edge", 20);
        store.add_to_sorted_set("reg:dev", "live", 30);
        assert_eq!(store.remove_range_by_score("reg:dev", 20), 1);
        assert_eq!(store.range_by_score("reg:dev", 0, None), vec!["edge", "live"]);
    }

    #[tokio::test]
    async fn test_values_expire() {
        let store = MemoryStore::new();
        store.set_with_expiry("reg:server:dev:a", "{}", 50.millis());
        store.set("reg:dev:a", "cmd");
        let ttl = store.ttl("reg:server:dev:a").unwrap_or_default();
        assert!(ttl > Duration::ZERO && ttl <= 50.millis());
        assert_eq!(store.ttl("reg:dev:a"), None);
        tokio::time::sleep(80.millis()).await;
        assert_eq!(store.get("reg:server:dev:a"), None);
        assert_eq!(
            store.multi_get(&["reg:server:dev:a".to_string(), "reg:dev:a".to_string()]),
            vec![None, Some("cmd".to_string())],
        );
    }

    #[test]
    fn test_delete_reports_existence() {
        let store = MemoryStore::new();
        store.set("reg:dev:a", "cmd");
        assert!(store.delete("reg:dev:a"));
        assert!(!store.delete("reg:dev:a"));
    }
}
