//! One-time code generation, storage, and verification.

mod generator;
mod redis_store;
mod store;
mod verifier;

pub use generator::CodeGenerator;
pub use redis_store::RedisCodeStore;
pub use store::{CodeStore, MemoryCodeStore};
pub use verifier::CodeVerifier;

use serde::{Deserialize, Serialize};

/// The live one-time code held for a subject key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpEntry {
    /// The generated code
    pub code: String,
    /// Issuance timestamp (Unix epoch seconds)
    pub issued_at: i64,
    /// Expiry timestamp
    pub expires_at: i64,
    /// Verification lookups against this entry, informational
    pub access_count: u32,
}

impl OtpEntry {
    pub fn new(code: impl Into<String>, issued_at: i64, ttl_secs: u64) -> Self {
        Self {
            code: code.into(),
            issued_at,
            expires_at: issued_at + ttl_secs as i64,
            access_count: 0,
        }
    }

    /// Returns true if the entry's expiry instant has passed
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at < now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_expiry_boundary() {
        let entry = OtpEntry::new("1234", 1_000, 300);
        assert_eq!(entry.expires_at, 1_300);
        assert!(!entry.is_expired(1_300));
        assert!(entry.is_expired(1_301));
    }
}
