//! Code store contract and the attempt-note memory backend.

use std::collections::HashMap;

use async_trait::async_trait;
use stepgate_common::StepUpError;
use tokio::sync::RwLock;

use super::OtpEntry;

/// Storage for live one-time codes, keyed by subject.
///
/// Two backends exist: `MemoryCodeStore` (attempt-scoped notes with an
/// explicit expiry instant the verifier checks itself) and
/// `RedisCodeStore` (a shared cache whose entries expire on their own).
/// Either way, a key holds at most one live entry and `put` supersedes
/// unconditionally.
#[async_trait]
pub trait CodeStore: Send + Sync {
    /// Store a code for `key`, overwriting any existing entry.
    /// Either fully stored or not stored - no partial failure.
    async fn put(&self, key: &str, code: &str, ttl_secs: u64) -> Result<(), StepUpError>;

    /// Look up the entry for `key`. Absence means no code: never issued,
    /// consumed, or (on auto-expiring backends) expired.
    async fn get(&self, key: &str) -> Result<Option<OtpEntry>, StepUpError>;

    /// Remove the entry for `key`. Idempotent - removing a non-existent
    /// key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StepUpError>;
}

/// In-process attempt-note backend.
///
/// Stores the code next to its expiry instant and never expires entries
/// on its own - a `get` can return an entry whose expiry has passed, and
/// the verifier treats that as "no valid code". Lookups do not count
/// accesses either; that bookkeeping belongs to the shared cache backend.
#[derive(Debug, Default)]
pub struct MemoryCodeStore {
    entries: RwLock<HashMap<String, OtpEntry>>,
}

impl MemoryCodeStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl CodeStore for MemoryCodeStore {
    async fn put(&self, key: &str, code: &str, ttl_secs: u64) -> Result<(), StepUpError> {
        let entry = OtpEntry::new(code, chrono::Utc::now().timestamp(), ttl_secs);
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<OtpEntry>, StepUpError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn remove(&self, key: &str) -> Result<(), StepUpError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let store = MemoryCodeStore::new();
        store.put("alice", "1234", 300).await.unwrap();

        let entry = store.get("alice").await.unwrap().unwrap();
        assert_eq!(entry.code, "1234");
        assert!(entry.expires_at > chrono::Utc::now().timestamp());
        assert_eq!(entry.access_count, 0);
    }

    #[tokio::test]
    async fn test_put_supersedes_prior_entry() {
        let store = MemoryCodeStore::new();
        store.put("alice", "1234", 300).await.unwrap();
        store.put("alice", "5678", 300).await.unwrap();

        let entry = store.get("alice").await.unwrap().unwrap();
        assert_eq!(entry.code, "5678");
    }

    #[tokio::test]
    async fn test_get_absent_key() {
        let store = MemoryCodeStore::new();
        assert!(store.get("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let store = MemoryCodeStore::new();
        store.put("alice", "1234", 300).await.unwrap();

        store.remove("alice").await.unwrap();
        assert!(store.get("alice").await.unwrap().is_none());

        // second remove of the same key is a no-op, not an error
        store.remove("alice").await.unwrap();
        assert!(store.get("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_no_auto_expiry() {
        // The memory backend keeps stale entries; staleness is the
        // verifier's explicit check.
        let store = MemoryCodeStore::new();
        store.put("alice", "1234", 0).await.unwrap();

        let entry = store.get("alice").await.unwrap().unwrap();
        assert_eq!(entry.expires_at, entry.issued_at);
    }
}
