/// Mailer backed by a transactional email HTTP API
///
/// Posts one JSON document per message:
///
/// ```json
/// { "from": "...", "to": ["..."], "subject": "...", "text": "...", "html": "..." }
/// ```
///
/// authenticated with `Authorization: Bearer <api key>`. Any 2xx answer
/// counts as accepted.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use super::{Email, MailError, Mailer};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

#[derive(Debug, Serialize)]
struct OutgoingMessage<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
    html: &'a str,
}

impl HttpMailer {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        from: impl Into<String>,
    ) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MailError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
            from: from.into(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    fn name(&self) -> &str {
        "http"
    }

    async fn send(&self, email: Email) -> Result<(), MailError> {
        let message = OutgoingMessage {
            from: &self.from,
            to: [&email.to],
            subject: &email.subject,
            text: &email.text,
            html: &email.html,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&message)
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(MailError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outgoing_message_shape() {
        let message = OutgoingMessage {
            from: "UpTask <admin@uptask.com>",
            to: ["ana@example.com"],
            subject: "Confirm",
            text: "code",
            html: "<b>code</b>",
        };

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["to"][0], "ana@example.com");
        assert_eq!(json["from"], "UpTask <admin@uptask.com>");
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_transport_error() {
        let mailer = HttpMailer::new("http://127.0.0.1:9/send", "key", "UpTask <a@b.c>").unwrap();
        let email = Email {
            to: "ana@example.com".to_string(),
            subject: "s".to_string(),
            text: "t".to_string(),
            html: "h".to_string(),
        };

        assert!(matches!(mailer.send(email).await, Err(MailError::Transport(_))));
    }
}
