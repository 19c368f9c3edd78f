/// Mailer that only logs
///
/// Used when no email API is configured. The message body, and with it
/// the one-time code, is logged at `info` so local signups can be
/// completed.

use async_trait::async_trait;
use tracing::info;

use super::{Email, MailError, Mailer};

#[derive(Debug, Clone)]
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, email: Email) -> Result<(), MailError> {
        info!(
            from = %self.from,
            to = %email.to,
            subject = %email.subject,
            body = %email.text,
            "Outgoing email"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_mailer_always_succeeds() {
        let mailer = LogMailer::new("UpTask <admin@uptask.com>");
        let email = Email {
            to: "ana@example.com".to_string(),
            subject: "Test".to_string(),
            text: "Body".to_string(),
            html: "<p>Body</p>".to_string(),
        };

        assert!(mailer.send(email).await.is_ok());
        assert_eq!(mailer.name(), "log");
    }
}
