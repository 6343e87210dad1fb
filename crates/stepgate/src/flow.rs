//! Per-attempt orchestration of the step-up flow.
//!
//! `begin` runs gate → generate → store → deliver with rollback on
//! delivery failure; `submit` runs verification and persists the
//! subject mutations of a successful attempt.

use std::sync::Arc;

use stepgate_common::{ChallengeOutcome, StepUpError, StepUpPolicy, Subject, VerifyOutcome};

use crate::directory::SubjectDirectory;
use crate::email::CodeMailer;
use crate::gate::{GateDecision, StepUpGate};
use crate::otp::{CodeGenerator, CodeStore, CodeVerifier};

pub struct StepUpFlow {
    policy: StepUpPolicy,
    gate: StepUpGate,
    generator: CodeGenerator,
    verifier: CodeVerifier,
    store: Arc<dyn CodeStore>,
    directory: Arc<dyn SubjectDirectory>,
    mailer: CodeMailer,
}

impl StepUpFlow {
    pub fn new(
        policy: StepUpPolicy,
        exempt_clients: Vec<String>,
        store: Arc<dyn CodeStore>,
        directory: Arc<dyn SubjectDirectory>,
        mailer: CodeMailer,
    ) -> Self {
        Self {
            gate: StepUpGate::new(&policy, exempt_clients),
            generator: CodeGenerator::new(),
            verifier: CodeVerifier::new(),
            policy,
            store,
            directory,
            mailer,
        }
    }

    /// Begin an authentication attempt: either let it through without a
    /// challenge or issue a code. Calling this again while a challenge
    /// is pending is the resend path - the fresh code supersedes the
    /// stored one.
    pub async fn begin(
        &self,
        subject_id: &str,
        client_id: Option<&str>,
    ) -> Result<ChallengeOutcome, StepUpError> {
        let Some(mut subject) = self.directory.find(subject_id).await? else {
            tracing::warn!(subject_id = %subject_id, "Attempt for unknown subject");
            return Err(StepUpError::SubjectMissing);
        };

        match self.gate.evaluate(&mut subject, client_id)? {
            GateDecision::Bypass(_) => Ok(ChallengeOutcome::Ok),
            GateDecision::Deferred { logins } => {
                self.directory.save(&subject).await?;
                tracing::debug!(subject_id = %subject.id, logins, "Challenge deferred");
                Ok(ChallengeOutcome::Ok)
            }
            GateDecision::Challenge => self.issue_challenge(&subject).await,
        }
    }

    async fn issue_challenge(&self, subject: &Subject) -> Result<ChallengeOutcome, StepUpError> {
        let Some(email) = subject.email.clone() else {
            tracing::warn!(subject_id = %subject.id, "Subject has no email address");
            return Err(StepUpError::NoDeliveryAddress(subject.id.clone()));
        };

        let code = self.generator.generate(self.policy.code_length);
        self.store
            .put(&subject.id, &code, self.policy.code_ttl_secs)
            .await?;

        if let Err(err) = self
            .mailer
            .deliver(subject, &email, &code, self.policy.code_ttl_secs)
            .await
        {
            // Roll back before surfacing the failure: a stored but
            // undeliverable code must not stay guessable until its TTL.
            if let Err(cleanup) = self.store.remove(&subject.id).await {
                tracing::error!(
                    subject_id = %subject.id,
                    error = %cleanup,
                    "Rollback of stored code failed"
                );
            }
            tracing::warn!(subject_id = %subject.id, error = %err, "Code delivery failed");
            return Err(err);
        }

        tracing::info!(subject_id = %subject.id, "Code challenge issued");
        Ok(ChallengeOutcome::Challenge {
            expires_in_secs: self.policy.code_ttl_secs,
        })
    }

    /// Verify a submitted code for the subject's pending challenge.
    pub async fn submit(
        &self,
        subject_id: &str,
        submitted: &str,
    ) -> Result<VerifyOutcome, StepUpError> {
        let Some(mut subject) = self.directory.find(subject_id).await? else {
            tracing::warn!(subject_id = %subject_id, "Submission for unknown subject");
            return Err(StepUpError::SubjectMissing);
        };

        let outcome = self
            .verifier
            .verify(self.store.as_ref(), &mut subject, submitted)
            .await?;

        if outcome.is_verified() {
            self.directory.save(&subject).await?;
        }

        Ok(outcome)
    }
}
