//! Write-through entity cache
//!
//! A cost-bounded concurrent cache in front of the database. Entity entries
//! hold the content hash of the last written row (`_user#{id}`,
//! `_chat#{id}`), verification entries hold the probe outcome
//! (`_verified#{id}`) and KV entries hold the raw bytes (`_kv#{key}`).

use moka::sync::Cache;

/// Maximum total cost of cached values (256 MiB).
const MAX_COST: u64 = 256 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    /// A content hash or other short string.
    Text(String),
    /// A cached boolean probe outcome.
    Flag(bool),
    /// Binary-serialised KV payload.
    Bytes(Vec<u8>),
}

impl CacheValue {
    /// Cost in bytes: length for strings and byte arrays, 1 otherwise.
    fn cost(&self) -> u32 {
        match self {
            CacheValue::Text(s) => s.len().min(u32::MAX as usize) as u32,
            CacheValue::Bytes(b) => b.len().min(u32::MAX as usize) as u32,
            CacheValue::Flag(_) => 1,
        }
    }
}

#[derive(Clone)]
pub struct EntityCache {
    inner: Cache<String, CacheValue>,
}

impl EntityCache {
    pub fn new() -> Self {
        let inner = Cache::builder()
            .max_capacity(MAX_COST)
            .initial_capacity(1024)
            .weigher(|key: &String, value: &CacheValue| {
                (key.len() as u32).saturating_add(value.cost()).max(1)
            })
            .build();

        Self { inner }
    }

    pub fn get(&self, key: &str) -> Option<CacheValue> {
        self.inner.get(key)
    }

    pub fn set(&self, key: String, value: CacheValue) {
        self.inner.insert(key, value);
    }

    pub fn delete(&self, key: &str) {
        self.inner.invalidate(key);
    }

    pub fn clear(&self) {
        self.inner.invalidate_all();
    }

    pub fn user_key(id: i64) -> String {
        format!("_user#{id}")
    }

    pub fn chat_key(id: i64) -> String {
        format!("_chat#{id}")
    }

    pub fn verified_key(id: i64) -> String {
        format!("_verified#{id}")
    }

    pub fn kv_key(key: &str) -> String {
        format!("_kv#{key}")
    }
}

impl Default for EntityCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_delete() {
        let cache = EntityCache::new();
        let key = EntityCache::user_key(42);

        assert_eq!(cache.get(&key), None);

        cache.set(key.clone(), CacheValue::Text("abc123".to_string()));
        assert_eq!(cache.get(&key), Some(CacheValue::Text("abc123".to_string())));

        cache.delete(&key);
        assert_eq!(cache.get(&key), None);
    }

    #[test]
    fn test_flag_values() {
        let cache = EntityCache::new();
        let key = EntityCache::verified_key(7);

        cache.set(key.clone(), CacheValue::Flag(false));
        assert_eq!(cache.get(&key), Some(CacheValue::Flag(false)));
    }

    #[test]
    fn test_key_namespaces_are_disjoint() {
        assert_ne!(EntityCache::user_key(1), EntityCache::chat_key(1));
        assert_ne!(EntityCache::chat_key(1), EntityCache::verified_key(1));
        assert_ne!(EntityCache::kv_key("1"), EntityCache::user_key(1));
    }
}
