//! Shared Redis cache backend for one-time codes.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use stepgate_common::StepUpError;
use stepgate_common::constants::redis_keys::OTP_PREFIX;

use super::{CodeStore, OtpEntry};

/// Redis-backed code store shared by all service instances.
///
/// Entries are written with `SET .. EX`, so the backend itself enforces
/// expiry and a lookup after the TTL simply finds nothing. Lookups count
/// accesses on an atomic sibling counter - the entry itself is never
/// written back, so a concurrent verify or resend for the same key
/// cannot race a lookup into resurrecting a consumed or superseded code.
#[derive(Clone)]
pub struct RedisCodeStore {
    redis: ConnectionManager,
}

impl RedisCodeStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    fn key(subject_key: &str) -> String {
        format!("{}{}", OTP_PREFIX, subject_key)
    }

    /// Access counter: otp:{subject_id}:hits
    fn hits_key(subject_key: &str) -> String {
        format!("{}{}:hits", OTP_PREFIX, subject_key)
    }
}

#[async_trait]
impl CodeStore for RedisCodeStore {
    async fn put(&self, key: &str, code: &str, ttl_secs: u64) -> Result<(), StepUpError> {
        let entry = OtpEntry::new(code, chrono::Utc::now().timestamp(), ttl_secs);
        let payload =
            serde_json::to_string(&entry).map_err(|e| StepUpError::Store(e.to_string()))?;

        let mut conn = self.redis.clone();
        conn.set_ex::<_, _, ()>(Self::key(key), payload, ttl_secs)
            .await
            .map_err(|e| StepUpError::Store(e.to_string()))?;

        // A fresh entry starts a fresh access count
        conn.del::<_, ()>(Self::hits_key(key))
            .await
            .map_err(|e| StepUpError::Store(e.to_string()))?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<OtpEntry>, StepUpError> {
        let redis_key = Self::key(key);
        let mut conn = self.redis.clone();

        let payload: Option<String> = conn
            .get(&redis_key)
            .await
            .map_err(|e| StepUpError::Store(e.to_string()))?;

        let Some(payload) = payload else {
            return Ok(None);
        };

        let mut entry: OtpEntry =
            serde_json::from_str(&payload).map_err(|e| StepUpError::Store(e.to_string()))?;

        // Count the lookup with a single atomic INCR on the sibling key;
        // the entry value stays read-only here.
        let hits_key = Self::hits_key(key);
        let hits: i64 = conn
            .incr(&hits_key, 1i64)
            .await
            .map_err(|e| StepUpError::Store(e.to_string()))?;
        entry.access_count = u32::try_from(hits).unwrap_or(u32::MAX);

        // The counter must not outlive the code it counts
        let remaining: i64 = conn
            .ttl(&redis_key)
            .await
            .map_err(|e| StepUpError::Store(e.to_string()))?;
        if remaining > 0 {
            conn.expire::<_, ()>(&hits_key, remaining)
                .await
                .map_err(|e| StepUpError::Store(e.to_string()))?;
        }

        Ok(Some(entry))
    }

    async fn remove(&self, key: &str) -> Result<(), StepUpError> {
        let mut conn = self.redis.clone();
        // DEL of a missing key is a no-op in Redis, which gives us
        // idempotent removal for free.
        conn.del::<_, ()>(Self::key(key))
            .await
            .map_err(|e| StepUpError::Store(e.to_string()))?;
        conn.del::<_, ()>(Self::hits_key(key))
            .await
            .map_err(|e| StepUpError::Store(e.to_string()))?;
        Ok(())
    }
}
