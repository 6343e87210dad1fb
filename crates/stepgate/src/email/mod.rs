//! Code delivery: template rendering and the mailer seam.
//!
//! Transport backends are swappable behind the `Mailer` trait:
//! - `SmtpMailer` - delivers via SMTP using lettre
//! - `ConsoleMailer` - logs delivery for development, body redacted

mod console;
mod smtp;
pub mod template;

pub use console::ConsoleMailer;
pub use smtp::SmtpMailer;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use stepgate_common::constants::TEMPLATE_CODE_KEY;
use stepgate_common::{StepUpError, Subject};

/// A rendered notification ready for handoff to the delivery backend.
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Delivery collaborator. Any failure is opaque to the caller and
/// triggers rollback of the stored code.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), StepUpError>;
}

/// Subject line and body templates for the code notification.
#[derive(Debug, Clone)]
pub struct EmailTemplates {
    pub subject: String,
    pub text: String,
    pub html: String,
}

impl EmailTemplates {
    /// Reject body templates that never inject the code. Caught at
    /// startup so a misconfigured template cannot silently send codeless
    /// mail per attempt.
    pub fn validate(&self) -> Result<(), StepUpError> {
        for (name, body) in [("text", &self.text), ("html", &self.html)] {
            if !template::references(body, TEMPLATE_CODE_KEY) {
                return Err(StepUpError::Config(format!(
                    "{} template does not reference {{{{{}}}}}",
                    name, TEMPLATE_CODE_KEY
                )));
            }
        }
        Ok(())
    }
}

/// Renders the code notification and hands it to the delivery backend.
pub struct CodeMailer {
    templates: EmailTemplates,
    mailer: Arc<dyn Mailer>,
}

impl CodeMailer {
    pub fn new(templates: EmailTemplates, mailer: Arc<dyn Mailer>) -> Self {
        Self { templates, mailer }
    }

    /// Render and deliver the code to `to`.
    ///
    /// The code is injected under the fixed `code` context key; rendering
    /// a body without the code in it is a render failure, not a partial
    /// success.
    pub async fn deliver(
        &self,
        subject: &Subject,
        to: &str,
        code: &str,
        ttl_secs: u64,
    ) -> Result<(), StepUpError> {
        let context = HashMap::from([
            (TEMPLATE_CODE_KEY, code.to_string()),
            ("username", subject.username.clone()),
            ("ttl_minutes", ttl_secs.div_ceil(60).to_string()),
        ]);

        let text = template::render(&self.templates.text, &context);
        let html = template::render(&self.templates.html, &context);
        if !text.contains(code) || !html.contains(code) {
            return Err(StepUpError::Render(
                "rendered body does not contain the code".into(),
            ));
        }

        let email = OutgoingEmail {
            to: to.to_string(),
            subject: template::render(&self.templates.subject, &context),
            text,
            html,
        };

        self.mailer.send(&email).await
    }
}

/// Test double shared by the email and flow tests.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use tokio::sync::Mutex;

    /// Records outgoing mail instead of sending it.
    pub(crate) struct RecordingMailer {
        pub sent: Mutex<Vec<OutgoingEmail>>,
    }

    impl RecordingMailer {
        pub fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &OutgoingEmail) -> Result<(), StepUpError> {
            self.sent.lock().await.push(email.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingMailer;
    use super::*;

    fn templates() -> EmailTemplates {
        EmailTemplates {
            subject: "Your verification code".into(),
            text: "Hello {{username}}, your code is {{code}} ({{ttl_minutes}} min).".into(),
            html: "<p>Hello {{username}}, your code is <strong>{{code}}</strong>.</p>".into(),
        }
    }

    #[tokio::test]
    async fn test_deliver_injects_code_in_both_bodies() {
        let mailer = Arc::new(RecordingMailer::new());
        let code_mailer = CodeMailer::new(templates(), mailer.clone());
        let subject = Subject::new("u1", "alice").with_email("alice@example.com");

        code_mailer
            .deliver(&subject, "alice@example.com", "1234", 300)
            .await
            .unwrap();

        let sent = mailer.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "alice@example.com");
        assert!(sent[0].text.contains("1234"));
        assert!(sent[0].html.contains("1234"));
        assert!(sent[0].text.contains("alice"));
        assert!(sent[0].text.contains("5 min"));
    }

    #[tokio::test]
    async fn test_codeless_body_is_render_failure() {
        let mut bad = templates();
        bad.text = "Hello {{username}}".into();

        let mailer = Arc::new(RecordingMailer::new());
        let code_mailer = CodeMailer::new(bad, mailer.clone());
        let subject = Subject::new("u1", "alice");

        let err = code_mailer
            .deliver(&subject, "alice@example.com", "1234", 300)
            .await
            .unwrap_err();
        assert!(matches!(err, StepUpError::Render(_)));
        assert!(mailer.sent.lock().await.is_empty());
    }

    #[test]
    fn test_template_validation_requires_code_key() {
        assert!(templates().validate().is_ok());

        let mut bad = templates();
        bad.html = "<p>Hello {{username}}</p>".into();
        assert!(bad.validate().is_err());
    }
}
