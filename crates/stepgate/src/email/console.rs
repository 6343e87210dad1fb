//! Console mailer for development.
//!
//! Logs delivery instead of sending. The body is never logged - it
//! contains the one-time code.

use async_trait::async_trait;
use stepgate_common::StepUpError;

use super::{Mailer, OutgoingEmail};

/// Development backend that records delivery in the log stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleMailer;

impl ConsoleMailer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), StepUpError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            text_bytes = email.text.len(),
            html_bytes = email.html.len(),
            "Email delivery (console backend, body redacted)"
        );
        Ok(())
    }
}
