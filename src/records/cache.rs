//! In-process read cache for parsed records.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

/// Unbounded map from record identifier to the last value read or written.
///
/// Entries never expire. Anything that mutates record files behind the store's
/// back (restoring a backup, hand edits) must be followed by [`RecordCache::clear`].
/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct RecordCache {
    entries: Arc<RwLock<HashMap<String, Arc<Value>>>>,
}

impl RecordCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Arc<Value>> {
        self.entries.read().get(key).cloned()
    }

    pub fn insert(&self, key: impl Into<String>, value: Arc<Value>) {
        self.entries.write().insert(key.into(), value);
    }

    pub fn remove(&self, key: &str) -> Option<Arc<Value>> {
        self.entries.write().remove(key)
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clones_share_entries() {
        let cache = RecordCache::new();
        let other = cache.clone();

        cache.insert("config/site", Arc::new(json!({"a": 1})));
        assert_eq!(other.len(), 1);

        other.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_get_returns_same_arc() {
        let cache = RecordCache::new();
        let value = Arc::new(json!({"hero": {"title": "Hi"}}));
        cache.insert("content/pages/home", Arc::clone(&value));

        let hit = cache.get("content/pages/home").unwrap();
        assert!(Arc::ptr_eq(&hit, &value));
        assert!(cache.get("content/pages/about").is_none());
    }

    #[test]
    fn test_remove_single_entry() {
        let cache = RecordCache::new();
        cache.insert("config/site", Arc::new(json!({})));
        cache.insert("config/seo", Arc::new(json!({})));

        assert!(cache.remove("config/site").is_some());
        assert!(cache.remove("config/site").is_none());
        assert_eq!(cache.len(), 1);
    }
}
