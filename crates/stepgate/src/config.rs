//! Configuration management for Stepgate.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::email::EmailTemplates;
use stepgate_common::StepUpPolicy;
use stepgate_common::constants::{
    DEFAULT_CODE_LENGTH, DEFAULT_CODE_TTL_SECS, DEFAULT_LISTEN_ADDR, DEFAULT_LOGIN_TRIGGER_COUNT,
    DEFAULT_REDIS_URL,
};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Storage backend selection
    #[serde(default)]
    pub storage: StorageConfig,

    /// Step-up policy configuration
    #[serde(default)]
    pub stepup: StepUpConfig,

    /// Notification configuration
    #[serde(default)]
    pub email: EmailConfig,
}

/// Backing storage for codes and synced subjects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// In-process maps; single instance, development
    Memory,
    /// Shared Redis; the code cache expires entries on its own
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_backend")]
    pub backend: StorageBackend,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
        }
    }
}

/// Step-up gating and code parameters
#[derive(Debug, Clone, Deserialize)]
pub struct StepUpConfig {
    /// One-time code length
    #[serde(default = "default_code_length")]
    pub code_length: usize,

    /// Challenge every Nth login (1 = every login)
    #[serde(default = "default_login_trigger_count")]
    pub login_trigger_count: u32,

    /// Code validity in seconds
    #[serde(default = "default_code_ttl")]
    pub code_ttl_secs: u64,

    /// Client identifiers exempt from step-up
    #[serde(default)]
    pub exempt_clients: Vec<String>,
}

impl StepUpConfig {
    pub fn policy(&self) -> StepUpPolicy {
        StepUpPolicy {
            code_length: self.code_length,
            login_trigger_count: self.login_trigger_count,
            code_ttl_secs: self.code_ttl_secs,
        }
    }
}

impl Default for StepUpConfig {
    fn default() -> Self {
        Self {
            code_length: default_code_length(),
            login_trigger_count: default_login_trigger_count(),
            code_ttl_secs: default_code_ttl(),
            exempt_clients: Vec::new(),
        }
    }
}

/// Delivery backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailBackend {
    /// Log-only delivery for development
    Console,
    /// SMTP relay via lettre
    Smtp,
}

/// Notification templates and transport settings
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_email_backend")]
    pub backend: EmailBackend,

    /// Sender address
    #[serde(default = "default_email_from")]
    pub from: String,

    /// SMTP relay host (required for the smtp backend)
    #[serde(default)]
    pub smtp_host: Option<String>,

    #[serde(default)]
    pub smtp_username: Option<String>,

    #[serde(default)]
    pub smtp_password: Option<String>,

    /// Subject line template
    #[serde(default = "default_subject_template")]
    pub subject_template: String,

    /// Plain-text body template; must reference {{code}}
    #[serde(default = "default_text_template")]
    pub text_template: String,

    /// HTML body template; must reference {{code}}
    #[serde(default = "default_html_template")]
    pub html_template: String,
}

impl EmailConfig {
    pub fn templates(&self) -> EmailTemplates {
        EmailTemplates {
            subject: self.subject_template.clone(),
            text: self.text_template.clone(),
            html: self.html_template.clone(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            backend: default_email_backend(),
            from: default_email_from(),
            smtp_host: None,
            smtp_username: None,
            smtp_password: None,
            subject_template: default_subject_template(),
            text_template: default_text_template(),
            html_template: default_html_template(),
        }
    }
}

// Default value functions
fn default_redis_url() -> String { DEFAULT_REDIS_URL.to_string() }
fn default_listen_addr() -> String { DEFAULT_LISTEN_ADDR.to_string() }
fn default_storage_backend() -> StorageBackend { StorageBackend::Redis }
fn default_code_length() -> usize { DEFAULT_CODE_LENGTH }
fn default_login_trigger_count() -> u32 { DEFAULT_LOGIN_TRIGGER_COUNT }
fn default_code_ttl() -> u64 { DEFAULT_CODE_TTL_SECS }
fn default_email_backend() -> EmailBackend { EmailBackend::Console }
fn default_email_from() -> String { "no-reply@example.com".to_string() }

fn default_subject_template() -> String {
    "Your verification code".to_string()
}

fn default_text_template() -> String {
    "Hello {{username}},\n\n\
     Your one-time verification code is {{code}}. \
     It expires in {{ttl_minutes}} minutes.\n"
        .to_string()
}

fn default_html_template() -> String {
    "<p>Hello {{username}},</p>\
     <p>Your one-time verification code is <strong>{{code}}</strong>. \
     It expires in {{ttl_minutes}} minutes.</p>"
        .to_string()
}

impl AppConfig {
    /// Load configuration from file, with CLI overrides
    pub fn load(config_path: &str, args: &super::Args) -> Result<Self> {
        let mut config = if Path::new(config_path).exists() {
            let settings = config::Config::builder()
                .add_source(config::File::with_name(config_path))
                .build()
                .context("Failed to load config file")?;

            settings
                .try_deserialize()
                .context("Failed to parse config")?
        } else {
            // Use defaults if config file doesn't exist
            tracing::warn!("Config file not found, using defaults");
            Self::default()
        };

        // Apply CLI overrides
        if let Some(ref redis_url) = args.redis_url {
            config.redis_url = redis_url.clone();
        }
        if let Some(ref listen) = args.listen {
            config.listen_addr = listen.clone();
        }

        config.validate()?;

        Ok(config)
    }

    /// Reject invalid policy and template settings before serving
    pub fn validate(&self) -> Result<()> {
        self.stepup.policy().validate()?;
        self.email.templates().validate()?;

        if self.email.backend == EmailBackend::Smtp && self.email.smtp_host.is_none() {
            anyhow::bail!("email.smtp_host is required for the smtp backend");
        }

        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            listen_addr: default_listen_addr(),
            storage: StorageConfig::default(),
            stepup: StepUpConfig::default(),
            email: EmailConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_smtp_backend_requires_host() {
        let mut config = AppConfig::default();
        config.email.backend = EmailBackend::Smtp;
        assert!(config.validate().is_err());

        config.email.smtp_host = Some("smtp.example.com".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_template_without_code_is_rejected() {
        let mut config = AppConfig::default();
        config.email.text_template = "Hello {{username}}".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_trigger_count_is_rejected() {
        let mut config = AppConfig::default();
        config.stepup.login_trigger_count = 0;
        assert!(config.validate().is_err());
    }
}
