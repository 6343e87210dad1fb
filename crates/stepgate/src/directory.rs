//! Subject directory: the synced view of the broker's identity store.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use stepgate_common::constants::redis_keys::SUBJECT_PREFIX;
use stepgate_common::{StepUpError, Subject};
use tokio::sync::RwLock;

/// Lookup and persistence for subjects synced in by the broker.
///
/// The broker owns subject data; this directory is the narrow contract
/// the step-up subsystem reads attributes through and writes the rolling
/// counter back to.
#[async_trait]
pub trait SubjectDirectory: Send + Sync {
    async fn find(&self, id: &str) -> Result<Option<Subject>, StepUpError>;
    async fn save(&self, subject: &Subject) -> Result<(), StepUpError>;
    async fn remove(&self, id: &str) -> Result<(), StepUpError>;
}

/// In-process directory for development and tests.
#[derive(Debug, Default)]
pub struct MemorySubjectDirectory {
    subjects: RwLock<HashMap<String, Subject>>,
}

impl MemorySubjectDirectory {
    pub fn new() -> Self {
        Self {
            subjects: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl SubjectDirectory for MemorySubjectDirectory {
    async fn find(&self, id: &str) -> Result<Option<Subject>, StepUpError> {
        Ok(self.subjects.read().await.get(id).cloned())
    }

    async fn save(&self, subject: &Subject) -> Result<(), StepUpError> {
        self.subjects
            .write()
            .await
            .insert(subject.id.clone(), subject.clone());
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), StepUpError> {
        self.subjects.write().await.remove(id);
        Ok(())
    }
}

/// Redis-backed directory shared by all service instances.
///
/// Subjects are plain JSON under `subject:{id}` with no TTL - they live
/// until the broker removes them.
#[derive(Clone)]
pub struct RedisSubjectDirectory {
    redis: ConnectionManager,
}

impl RedisSubjectDirectory {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    fn key(id: &str) -> String {
        format!("{}{}", SUBJECT_PREFIX, id)
    }
}

#[async_trait]
impl SubjectDirectory for RedisSubjectDirectory {
    async fn find(&self, id: &str) -> Result<Option<Subject>, StepUpError> {
        let mut conn = self.redis.clone();
        let payload: Option<String> = conn
            .get(Self::key(id))
            .await
            .map_err(|e| StepUpError::Store(e.to_string()))?;

        match payload {
            Some(p) => Ok(Some(
                serde_json::from_str(&p).map_err(|e| StepUpError::Store(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    async fn save(&self, subject: &Subject) -> Result<(), StepUpError> {
        let payload =
            serde_json::to_string(subject).map_err(|e| StepUpError::Store(e.to_string()))?;
        let mut conn = self.redis.clone();
        conn.set::<_, _, ()>(Self::key(&subject.id), payload)
            .await
            .map_err(|e| StepUpError::Store(e.to_string()))?;
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), StepUpError> {
        let mut conn = self.redis.clone();
        conn.del::<_, ()>(Self::key(id))
            .await
            .map_err(|e| StepUpError::Store(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_directory_roundtrip() {
        let directory = MemorySubjectDirectory::new();
        let subject = Subject::new("u1", "alice").with_email("alice@example.com");

        directory.save(&subject).await.unwrap();
        let found = directory.find("u1").await.unwrap().unwrap();
        assert_eq!(found.username, "alice");
        assert_eq!(found.email.as_deref(), Some("alice@example.com"));

        directory.remove("u1").await.unwrap();
        assert!(directory.find("u1").await.unwrap().is_none());
    }
}
