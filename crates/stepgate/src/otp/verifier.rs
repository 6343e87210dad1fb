//! One-time code verification.

use stepgate_common::constants::{CODE_ALPHABET, attributes};
use stepgate_common::{InvalidReason, StepUpError, Subject, VerifyOutcome};

use super::CodeStore;

/// Verifies submitted codes against the store.
///
/// Per attempt the state machine is `AWAITING_SUBMISSION` to one of the
/// terminal `VerifyOutcome` states. Expiry is checked before the codes
/// are compared, and a correct-but-expired submission still reports
/// `Expired` so the caller can offer a resend instead of a retry.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeVerifier;

impl CodeVerifier {
    pub fn new() -> Self {
        Self
    }

    /// Verify `submitted` for the subject and finalize on success:
    /// the stored entry is consumed (single-use) and the rolling login
    /// counter is cleared unless the subject carries the skip flag.
    ///
    /// Mismatches leave the entry intact to allow retries within the
    /// TTL window.
    pub async fn verify(
        &self,
        store: &dyn CodeStore,
        subject: &mut Subject,
        submitted: &str,
    ) -> Result<VerifyOutcome, StepUpError> {
        self.verify_at(store, subject, submitted, chrono::Utc::now().timestamp())
            .await
    }

    async fn verify_at(
        &self,
        store: &dyn CodeStore,
        subject: &mut Subject,
        submitted: &str,
        now: i64,
    ) -> Result<VerifyOutcome, StepUpError> {
        let Some(entry) = store.get(&subject.id).await? else {
            tracing::debug!(subject_id = %subject.id, "No live code for submission");
            return Ok(VerifyOutcome::invalid(InvalidReason::NoCode));
        };

        if entry.is_expired(now) {
            tracing::debug!(subject_id = %subject.id, "Submitted code expired");
            return Ok(VerifyOutcome::expired());
        }

        if submitted.is_empty() || !submitted.bytes().all(|b| CODE_ALPHABET.contains(&b)) {
            tracing::debug!(subject_id = %subject.id, "Submission outside code alphabet");
            return Ok(VerifyOutcome::invalid(InvalidReason::Malformed));
        }

        if !codes_match(&entry.code, submitted) {
            tracing::debug!(
                subject_id = %subject.id,
                access_count = entry.access_count,
                "Submitted code does not match"
            );
            return Ok(VerifyOutcome::invalid(InvalidReason::Mismatch));
        }

        // Single-use: consume the entry before reporting success so a
        // replayed submission finds nothing.
        store.remove(&subject.id).await?;
        if !subject.skips_step_up() {
            subject.remove_attribute(attributes::LOGIN_COUNT);
        }

        tracing::info!(subject_id = %subject.id, "Code verified");
        Ok(VerifyOutcome::Verified)
    }
}

/// Constant-time string comparison to avoid leaking match positions
/// through timing. Different lengths compare unequal.
fn codes_match(stored: &str, submitted: &str) -> bool {
    use subtle::ConstantTimeEq;
    stored.as_bytes().ct_eq(submitted.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::otp::MemoryCodeStore;
    use stepgate_common::constants::attributes;

    fn subject() -> Subject {
        let mut subject = Subject::new("alice", "alice").with_email("alice@example.com");
        subject.set_attribute(attributes::LOGIN_COUNT, "2");
        subject
    }

    #[tokio::test]
    async fn test_correct_code_verifies_and_consumes() {
        let store = MemoryCodeStore::new();
        let mut subject = subject();
        store.put(&subject.id, "1234", 300).await.unwrap();

        let outcome = CodeVerifier::new()
            .verify(&store, &mut subject, "1234")
            .await
            .unwrap();

        assert_eq!(outcome, VerifyOutcome::Verified);
        // single-use: the entry is gone
        assert!(store.get(&subject.id).await.unwrap().is_none());
        // counter cleared on success
        assert_eq!(subject.attribute(attributes::LOGIN_COUNT), None);
    }

    #[tokio::test]
    async fn test_replay_after_consumption_is_no_code() {
        let store = MemoryCodeStore::new();
        let mut subject = subject();
        store.put(&subject.id, "1234", 300).await.unwrap();

        let verifier = CodeVerifier::new();
        verifier.verify(&store, &mut subject, "1234").await.unwrap();
        let outcome = verifier.verify(&store, &mut subject, "1234").await.unwrap();

        assert_eq!(outcome, VerifyOutcome::invalid(InvalidReason::NoCode));
    }

    #[tokio::test]
    async fn test_expired_code_is_expired_even_if_correct() {
        let store = MemoryCodeStore::new();
        let mut subject = subject();
        store.put(&subject.id, "1234", 300).await.unwrap();

        let future = chrono::Utc::now().timestamp() + 301;
        let outcome = CodeVerifier::new()
            .verify_at(&store, &mut subject, "1234", future)
            .await
            .unwrap();

        assert_eq!(outcome, VerifyOutcome::expired());
        // not consumed and counter untouched; a resend will supersede
        assert!(store.get(&subject.id).await.unwrap().is_some());
        assert_eq!(subject.attribute(attributes::LOGIN_COUNT), Some("2"));
    }

    #[tokio::test]
    async fn test_mismatch_leaves_entry_intact() {
        let store = MemoryCodeStore::new();
        let mut subject = subject();
        store.put(&subject.id, "1234", 300).await.unwrap();

        let outcome = CodeVerifier::new()
            .verify(&store, &mut subject, "9999")
            .await
            .unwrap();

        assert_eq!(outcome, VerifyOutcome::invalid(InvalidReason::Mismatch));
        assert!(store.get(&subject.id).await.unwrap().is_some());
        assert_eq!(subject.attribute(attributes::LOGIN_COUNT), Some("2"));
    }

    #[tokio::test]
    async fn test_superseded_code_mismatches() {
        let store = MemoryCodeStore::new();
        let mut subject = subject();
        store.put(&subject.id, "1234", 300).await.unwrap();
        // resend overwrote the first code
        store.put(&subject.id, "5678", 300).await.unwrap();

        let outcome = CodeVerifier::new()
            .verify(&store, &mut subject, "1234")
            .await
            .unwrap();

        assert_eq!(outcome, VerifyOutcome::invalid(InvalidReason::Mismatch));
    }

    #[tokio::test]
    async fn test_malformed_submission() {
        let store = MemoryCodeStore::new();
        let mut subject = subject();
        store.put(&subject.id, "1234", 300).await.unwrap();

        let verifier = CodeVerifier::new();
        for bad in ["12a4", "", " 1234"] {
            let outcome = verifier.verify(&store, &mut subject, bad).await.unwrap();
            assert_eq!(outcome, VerifyOutcome::invalid(InvalidReason::Malformed));
        }
        assert!(store.get(&subject.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_skip_flag_subject_keeps_counter_on_success() {
        let store = MemoryCodeStore::new();
        let mut subject = subject();
        subject.set_attribute(attributes::SKIP_STEP_UP, "true");
        store.put(&subject.id, "1234", 300).await.unwrap();

        let outcome = CodeVerifier::new()
            .verify(&store, &mut subject, "1234")
            .await
            .unwrap();

        assert_eq!(outcome, VerifyOutcome::Verified);
        assert_eq!(subject.attribute(attributes::LOGIN_COUNT), Some("2"));
    }
}
