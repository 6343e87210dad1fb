//! Core types shared across Stepgate components.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CODE_LENGTH, DEFAULT_CODE_TTL_SECS, DEFAULT_LOGIN_TRIGGER_COUNT, attributes,
};
use crate::error::StepUpError;

/// The identity under authentication.
///
/// Subject data is owned by the broker's identity store; this is the
/// synced copy the step-up subsystem reads and writes through the
/// attribute contract below. All attributes are string-valued to match
/// the external store's generic attribute model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    /// Stable identifier
    pub id: String,

    /// Login name, used in notification templates
    pub username: String,

    /// Delivery address for one-time codes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Named string attributes (skip flag, rolling login counter, ...)
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl Subject {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            email: None,
            attributes: HashMap::new(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Get a named attribute
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Set a named attribute, replacing any prior value
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Remove a named attribute. Removing an absent attribute is a no-op.
    pub fn remove_attribute(&mut self, name: &str) {
        self.attributes.remove(name);
    }

    /// Returns true if the subject carries the explicit step-up skip flag
    pub fn skips_step_up(&self) -> bool {
        self.attribute(attributes::SKIP_STEP_UP) == Some("true")
    }
}

/// Step-up policy resolved once per authenticator configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StepUpPolicy {
    /// One-time code length in characters
    pub code_length: usize,

    /// Challenge every Nth login; 1 means every login
    pub login_trigger_count: u32,

    /// One-time code validity in seconds
    pub code_ttl_secs: u64,
}

impl StepUpPolicy {
    /// Validate policy bounds. Called once at startup.
    pub fn validate(&self) -> Result<(), StepUpError> {
        if self.code_length == 0 {
            return Err(StepUpError::Config("code_length must be > 0".into()));
        }
        if self.login_trigger_count == 0 {
            return Err(StepUpError::Config(
                "login_trigger_count must be >= 1".into(),
            ));
        }
        if self.code_ttl_secs == 0 {
            return Err(StepUpError::Config("code_ttl_secs must be > 0".into()));
        }
        Ok(())
    }
}

impl Default for StepUpPolicy {
    fn default() -> Self {
        Self {
            code_length: DEFAULT_CODE_LENGTH,
            login_trigger_count: DEFAULT_LOGIN_TRIGGER_COUNT,
            code_ttl_secs: DEFAULT_CODE_TTL_SECS,
        }
    }
}

/// Outcome of beginning an authentication attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ChallengeOutcome {
    /// The attempt succeeds without a code challenge
    Ok,
    /// A code was issued and delivered; awaiting submission
    Challenge { expires_in_secs: u64 },
}

/// Why a submission was rejected as invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    /// No live code for the subject - never issued or already consumed
    NoCode,
    /// Submitted value does not equal the stored code
    Mismatch,
    /// Submitted value contains characters outside the code alphabet
    Malformed,
}

/// Terminal verification states for a submitted code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum VerifyOutcome {
    /// Code matched before expiry; the attempt is finalized
    Verified,
    /// Code expired; the caller should offer a resend path, distinct
    /// from the retry path a mismatch gets
    Expired {
        #[serde(default = "default_resend")]
        resend: bool,
    },
    /// Code rejected; the stored entry is left intact for retries
    Invalid { reason: InvalidReason },
}

impl VerifyOutcome {
    /// Expired outcome carrying the resend invitation
    pub fn expired() -> Self {
        Self::Expired { resend: true }
    }

    pub fn invalid(reason: InvalidReason) -> Self {
        Self::Invalid { reason }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }
}

fn default_resend() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_defaults_are_valid() {
        assert!(StepUpPolicy::default().validate().is_ok());
    }

    #[test]
    fn test_policy_rejects_zero_fields() {
        let mut policy = StepUpPolicy::default();
        policy.code_length = 0;
        assert!(policy.validate().is_err());

        let mut policy = StepUpPolicy::default();
        policy.login_trigger_count = 0;
        assert!(policy.validate().is_err());

        let mut policy = StepUpPolicy::default();
        policy.code_ttl_secs = 0;
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_subject_attribute_contract() {
        let mut subject = Subject::new("u1", "alice");
        assert_eq!(subject.attribute("number_of_login"), None);

        subject.set_attribute("number_of_login", "1");
        assert_eq!(subject.attribute("number_of_login"), Some("1"));

        subject.set_attribute("number_of_login", "2");
        assert_eq!(subject.attribute("number_of_login"), Some("2"));

        subject.remove_attribute("number_of_login");
        subject.remove_attribute("number_of_login");
        assert_eq!(subject.attribute("number_of_login"), None);
    }

    #[test]
    fn test_skip_flag_must_be_literal_true() {
        let mut subject = Subject::new("u1", "alice");
        assert!(!subject.skips_step_up());

        subject.set_attribute("skip_mfa", "yes");
        assert!(!subject.skips_step_up());

        subject.set_attribute("skip_mfa", "true");
        assert!(subject.skips_step_up());
    }
}
