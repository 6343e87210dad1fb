//! Common error types for Stepgate components.

use thiserror::Error;

/// Common errors across Stepgate components.
///
/// Code mismatch and code expiry are deliberately NOT errors - they are
/// ordinary verification outcomes (see `VerifyOutcome`) and map to their
/// own challenge responses.
#[derive(Debug, Error)]
pub enum StepUpError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No authenticated subject bound to the attempt
    #[error("No subject bound to this authentication attempt")]
    SubjectMissing,

    /// Subject has no address to deliver the code to
    #[error("Subject {0} has no delivery address")]
    NoDeliveryAddress(String),

    /// Notification template could not be rendered
    #[error("Template render error: {0}")]
    Render(String),

    /// Delivery collaborator failure; the stored code is rolled back
    #[error("Code delivery failed: {0}")]
    Delivery(String),

    /// Rolling login counter attribute is not a valid integer.
    /// Indicates a data integrity bug in the identity store.
    #[error("Corrupt login counter {value:?} for subject {subject}")]
    CounterCorrupt { subject: String, value: String },

    /// Code store / subject directory backend error
    #[error("Store error: {0}")]
    Store(String),
}

impl StepUpError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Config(_) => 500,
            Self::SubjectMissing => 401,
            Self::NoDeliveryAddress(_) => 422,
            Self::Render(_) => 500,
            Self::Delivery(_) => 502,
            Self::CounterCorrupt { .. } => 500,
            Self::Store(_) => 503,
        }
    }

    /// Returns true if this error should be retried
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Delivery(_) | Self::Store(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(StepUpError::SubjectMissing.status_code(), 401);
        assert_eq!(
            StepUpError::NoDeliveryAddress("alice".into()).status_code(),
            422
        );
        assert_eq!(StepUpError::Delivery("smtp down".into()).status_code(), 502);
    }

    #[test]
    fn test_retryable() {
        assert!(StepUpError::Delivery("timeout".into()).is_retryable());
        assert!(StepUpError::Store("redis gone".into()).is_retryable());
        assert!(!StepUpError::SubjectMissing.is_retryable());
        assert!(
            !StepUpError::CounterCorrupt {
                subject: "alice".into(),
                value: "NaN".into()
            }
            .is_retryable()
        );
    }
}
