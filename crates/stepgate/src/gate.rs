//! Step-up gate: decides whether an attempt needs a code challenge.

use stepgate_common::constants::attributes;
use stepgate_common::{StepUpError, StepUpPolicy, Subject};

/// Why the gate let an attempt through without a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BypassReason {
    /// Subject carries the explicit skip flag
    SkipFlag,
    /// Initiating client is on the exempt list
    ExemptClient,
}

/// Gate decision for one authentication attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Succeed immediately, nothing persisted
    Bypass(BypassReason),
    /// Succeed without a challenge; the rolling counter was updated and
    /// the subject must be persisted by the caller
    Deferred { logins: u32 },
    /// Proceed to issue a code challenge
    Challenge,
}

/// Decides, before any code is generated, whether the current attempt
/// is challenged at all. Rules are evaluated in order, first match wins:
/// skip flag, exempt client, trigger-every-login, counter initialization,
/// counter increment, challenge.
#[derive(Debug, Clone)]
pub struct StepUpGate {
    login_trigger_count: u32,
    exempt_clients: Vec<String>,
}

impl StepUpGate {
    pub fn new(policy: &StepUpPolicy, exempt_clients: Vec<String>) -> Self {
        Self {
            login_trigger_count: policy.login_trigger_count,
            exempt_clients,
        }
    }

    /// Evaluate the gate for `subject`. On `Deferred` the counter
    /// attribute has been mutated and the caller persists the subject;
    /// on `Challenge` the counter is left untouched until successful
    /// verification clears it.
    pub fn evaluate(
        &self,
        subject: &mut Subject,
        client_id: Option<&str>,
    ) -> Result<GateDecision, StepUpError> {
        if subject.skips_step_up() {
            tracing::debug!(subject_id = %subject.id, "Step-up skipped by subject flag");
            return Ok(GateDecision::Bypass(BypassReason::SkipFlag));
        }

        if let Some(client) = client_id {
            if self.is_exempt_client(client) {
                tracing::debug!(subject_id = %subject.id, client_id = %client, "Step-up skipped for exempt client");
                return Ok(GateDecision::Bypass(BypassReason::ExemptClient));
            }
        }

        if self.login_trigger_count <= 1 {
            return Ok(GateDecision::Challenge);
        }

        let Some(raw) = subject.attribute(attributes::LOGIN_COUNT) else {
            // First login with counting active is never challenged.
            subject.set_attribute(attributes::LOGIN_COUNT, "1");
            return Ok(GateDecision::Deferred { logins: 1 });
        };

        let logins: u32 = raw.parse().map_err(|_| {
            let err = StepUpError::CounterCorrupt {
                subject: subject.id.clone(),
                value: raw.to_string(),
            };
            tracing::error!(subject_id = %subject.id, counter = %raw, "Login counter is not a number");
            err
        })?;

        // Saturate: an out-of-range synced counter must challenge, not
        // wrap around or panic.
        let next = logins.saturating_add(1);
        if next < self.login_trigger_count {
            subject.set_attribute(attributes::LOGIN_COUNT, next.to_string());
            return Ok(GateDecision::Deferred { logins: next });
        }

        Ok(GateDecision::Challenge)
    }

    fn is_exempt_client(&self, client_id: &str) -> bool {
        self.exempt_clients
            .iter()
            .any(|c| c.eq_ignore_ascii_case(client_id))
    }
}
