//! Bounded in-memory dedupe set for webhook deliveries.
//!
//! Keyed by the `X-Hub-Signature-256` header when present, else a stable
//! hash of the body. Entries are removed once the handler finishes, so the
//! set only needs to be large enough to catch retries that land while a
//! request is still in flight.

use std::collections::VecDeque;
use std::hash::{Hash, Hasher};

use tokio::sync::Mutex;

/// Default cap on the number of in-flight keys tracked at once.
pub const DEFAULT_CAPACITY: usize = 4096;

/// Compute a stable dedupe key for a request body with no signature header.
#[must_use]
pub fn body_hash(body: &[u8]) -> String {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    body.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// A bounded FIFO-evicting set of in-flight dedupe keys.
pub struct DedupeSet {
    capacity: usize,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    order: VecDeque<String>,
    members: std::collections::HashSet<String>,
}

impl DedupeSet {
    /// Construct a set bounded to `capacity` keys.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { capacity, inner: Mutex::new(Inner::default()) }
    }

    /// Insert `key`. Returns `true` if it was already present (a duplicate delivery).
    pub async fn test_and_insert(&self, key: &str) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.members.contains(key) {
            return true;
        }
        if inner.order.len() >= self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.members.remove(&oldest);
            }
        }
        inner.order.push_back(key.to_string());
        inner.members.insert(key.to_string());
        false
    }

    /// Remove `key`, once its handler has finished running.
    pub async fn remove(&self, key: &str) {
        let mut inner = self.inner.lock().await;
        inner.members.remove(key);
        inner.order.retain(|k| k != key);
    }
}

impl Default for DedupeSet {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_insert_of_same_key_is_reported_as_duplicate() {
        let set = DedupeSet::new(16);
        assert!(!set.test_and_insert("abc").await);
        assert!(set.test_and_insert("abc").await);
    }

    #[tokio::test]
    async fn remove_allows_reinsertion() {
        let set = DedupeSet::new(16);
        set.test_and_insert("abc").await;
        set.remove("abc").await;
        assert!(!set.test_and_insert("abc").await);
    }

    #[tokio::test]
    async fn bounded_capacity_evicts_oldest() {
        let set = DedupeSet::new(2);
        set.test_and_insert("a").await;
        set.test_and_insert("b").await;
        set.test_and_insert("c").await;
        assert!(!set.test_and_insert("a").await, "a should have been evicted and re-insertable");
    }

    #[test]
    fn body_hash_is_deterministic() {
        assert_eq!(body_hash(b"hello"), body_hash(b"hello"));
        assert_ne!(body_hash(b"hello"), body_hash(b"world"));
    }
}
