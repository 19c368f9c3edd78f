/// Outbound transactional email
///
/// Account confirmation and password reset codes reach the user by email.
/// The [`Mailer`] trait is the seam between the account flows and the
/// transport:
///
/// - [`LogMailer`]: writes the message to the log (development)
/// - [`HttpMailer`]: posts the message to an HTTP email API
///
/// Delivery never blocks or fails a request: handlers hand the message to
/// [`dispatch`], which sends it on a background task and logs failures.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use uptask_shared::mail::{dispatch, templates, LogMailer, Mailer};
///
/// # async fn example() {
/// let mailer: Arc<dyn Mailer> = Arc::new(LogMailer::new("UpTask <admin@uptask.com>"));
/// let email = templates::confirmation_email("ana@example.com", "Ana", "482913", "http://localhost:5173");
/// dispatch(mailer, email);
/// # }
/// ```

pub mod http;
pub mod log;
pub mod templates;

pub use self::http::HttpMailer;
pub use self::log::LogMailer;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// A rendered message ready to send
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// Transport could not reach the provider
    #[error("Mail transport error: {0}")]
    Transport(String),

    /// Provider answered with a non-success status
    #[error("Mail provider rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Transport name for logs
    fn name(&self) -> &str;

    async fn send(&self, email: Email) -> Result<(), MailError>;
}

/// Sends `email` on a background task
///
/// Failures are logged at `warn` and otherwise ignored.
pub fn dispatch(mailer: Arc<dyn Mailer>, email: Email) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let to = email.to.clone();
        let subject = email.subject.clone();

        match mailer.send(email).await {
            Ok(()) => debug!(mailer = mailer.name(), to = %to, subject = %subject, "Email sent"),
            Err(e) => warn!(
                mailer = mailer.name(),
                to = %to,
                subject = %subject,
                error = %e,
                "Failed to send email"
            ),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingMailer {
        sent: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Mailer for CountingMailer {
        fn name(&self) -> &str {
            "counting"
        }

        async fn send(&self, _email: Email) -> Result<(), MailError> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(MailError::Transport("offline".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn email() -> Email {
        Email {
            to: "ana@example.com".to_string(),
            subject: "Hi".to_string(),
            text: "Hello".to_string(),
            html: "<p>Hello</p>".to_string(),
        }
    }

    #[tokio::test]
    async fn test_dispatch_sends_in_background() {
        let mailer = Arc::new(CountingMailer {
            sent: AtomicUsize::new(0),
            fail: false,
        });

        dispatch(mailer.clone(), email()).await.unwrap();
        assert_eq!(mailer.sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dispatch_swallows_failures() {
        let mailer = Arc::new(CountingMailer {
            sent: AtomicUsize::new(0),
            fail: true,
        });

        // The spawned task completes normally even though delivery failed
        assert!(dispatch(mailer.clone(), email()).await.is_ok());
        assert_eq!(mailer.sent.load(Ordering::SeqCst), 1);
    }
}
