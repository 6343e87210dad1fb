//! SMTP delivery backend using lettre.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use stepgate_common::StepUpError;

use super::{Mailer, OutgoingEmail};

/// SMTP mailer over TLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build a relay transport to `host`. Credentials are optional for
    /// relays that authenticate by network position.
    pub fn new(
        host: &str,
        username: Option<String>,
        password: Option<String>,
        from: &str,
    ) -> Result<Self, StepUpError> {
        let from = from
            .parse()
            .map_err(|e| StepUpError::Config(format!("invalid from address {from:?}: {e}")))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| StepUpError::Config(format!("SMTP relay {host:?}: {e}")))?;
        if let (Some(username), Some(password)) = (username, password) {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), StepUpError> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| StepUpError::Delivery(format!("invalid recipient: {e}")))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&email.subject)
            .multipart(MultiPart::alternative_plain_html(
                email.text.clone(),
                email.html.clone(),
            ))
            .map_err(|e| StepUpError::Delivery(format!("message build: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| StepUpError::Delivery(e.to_string()))?;

        Ok(())
    }
}
