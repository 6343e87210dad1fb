//! Application state and shared resources.

use anyhow::{Context, Result};
use redis::aio::ConnectionManager;
use std::sync::Arc;

use crate::config::{AppConfig, EmailBackend, StorageBackend};
use crate::directory::{MemorySubjectDirectory, RedisSubjectDirectory, SubjectDirectory};
use crate::email::{CodeMailer, ConsoleMailer, Mailer, SmtpMailer};
use crate::flow::StepUpFlow;
use crate::otp::{CodeStore, MemoryCodeStore, RedisCodeStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,

    /// Per-attempt step-up orchestration
    pub flow: Arc<StepUpFlow>,

    /// Subject directory, exposed for the broker sync endpoints
    pub directory: Arc<dyn SubjectDirectory>,

    /// Redis connection manager (auto-reconnecting); None for the
    /// memory backend
    pub redis: Option<ConnectionManager>,
}

impl AppState {
    /// Create new application state, connecting to Redis when it is the
    /// configured backend
    pub async fn new(config: AppConfig) -> Result<Self> {
        let (store, directory, redis): (
            Arc<dyn CodeStore>,
            Arc<dyn SubjectDirectory>,
            Option<ConnectionManager>,
        ) = match config.storage.backend {
            StorageBackend::Redis => {
                let client = redis::Client::open(config.redis_url.as_str())
                    .context("Failed to create Redis client")?;

                // Connection manager handles reconnection
                let conn = ConnectionManager::new(client)
                    .await
                    .context("Failed to connect to Redis")?;

                (
                    Arc::new(RedisCodeStore::new(conn.clone())),
                    Arc::new(RedisSubjectDirectory::new(conn.clone())),
                    Some(conn),
                )
            }
            StorageBackend::Memory => (
                Arc::new(MemoryCodeStore::new()),
                Arc::new(MemorySubjectDirectory::new()),
                None,
            ),
        };

        let mailer: Arc<dyn Mailer> = match config.email.backend {
            EmailBackend::Console => Arc::new(ConsoleMailer::new()),
            EmailBackend::Smtp => {
                let host = config
                    .email
                    .smtp_host
                    .as_deref()
                    .context("email.smtp_host is required for the smtp backend")?;
                Arc::new(SmtpMailer::new(
                    host,
                    config.email.smtp_username.clone(),
                    config.email.smtp_password.clone(),
                    &config.email.from,
                )?)
            }
        };

        let flow = Arc::new(StepUpFlow::new(
            config.stepup.policy(),
            config.stepup.exempt_clients.clone(),
            store,
            directory.clone(),
            CodeMailer::new(config.email.templates(), mailer),
        ));

        Ok(Self {
            config,
            flow,
            directory,
            redis,
        })
    }
}
