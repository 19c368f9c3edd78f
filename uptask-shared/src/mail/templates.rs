/// Account emails
///
/// Both messages carry the recipient's name, the six-digit code, a link to
/// the matching frontend page and the code's lifetime.

use super::Email;
use crate::auth::code::CODE_TTL_MINUTES;

/// Email sent after signup, and again when an unconfirmed user logs in or
/// requests a new code
pub fn confirmation_email(to: &str, name: &str, code: &str, frontend_url: &str) -> Email {
    let link = format!("{}/auth/confirm-account", frontend_url.trim_end_matches('/'));

    Email {
        to: to.to_string(),
        subject: "UpTask - account confirmation".to_string(),
        text: format!(
            "Hi {name}, your UpTask account is almost ready, you just have to confirm it.\n\
             Visit {link} and submit the code: {code}\n\
             This code expires in {CODE_TTL_MINUTES} minutes."
        ),
        html: format!(
            "<p>Hi {name}, your UpTask account is almost ready, you just have to confirm it.</p>\
             <p>Visit the following link:</p>\
             <a href=\"{link}\">Confirm your account</a>\
             <p>And submit the code: <b>{code}</b></p>\
             <p>This code expires in {CODE_TTL_MINUTES} minutes.</p>",
            name = escape_html(name),
        ),
    }
}

/// Email sent by forgot-password
pub fn password_reset_email(to: &str, name: &str, code: &str, frontend_url: &str) -> Email {
    let link = format!("{}/auth/new-password", frontend_url.trim_end_matches('/'));

    Email {
        to: to.to_string(),
        subject: "UpTask - reset your password".to_string(),
        text: format!(
            "Hi {name}, you asked to reset your UpTask password.\n\
             Visit {link} and submit the code: {code}\n\
             This code expires in {CODE_TTL_MINUTES} minutes."
        ),
        html: format!(
            "<p>Hi {name}, you asked to reset your UpTask password.</p>\
             <p>Visit the following link:</p>\
             <a href=\"{link}\">Reset password</a>\
             <p>And submit the code: <b>{code}</b></p>\
             <p>This code expires in {CODE_TTL_MINUTES} minutes.</p>",
            name = escape_html(name),
        ),
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_email_contents() {
        let email = confirmation_email("ana@example.com", "Ana", "482913", "http://localhost:5173/");

        assert_eq!(email.to, "ana@example.com");
        assert!(email.subject.contains("confirmation"));
        assert!(email.html.contains("<b>482913</b>"));
        assert!(email.html.contains("http://localhost:5173/auth/confirm-account"));
        assert!(email.text.contains("482913"));
        assert!(email.text.contains("10 minutes"));
    }

    #[test]
    fn test_password_reset_email_contents() {
        let email = password_reset_email("ana@example.com", "Ana", "111222", "https://app.uptask.dev");

        assert!(email.subject.contains("password"));
        assert!(email.html.contains("https://app.uptask.dev/auth/new-password"));
        assert!(email.html.contains("111222"));
        assert!(email.text.contains("10 minutes"));
    }

    #[test]
    fn test_name_is_escaped_in_html() {
        let email = confirmation_email("x@example.com", "<script>", "123456", "http://localhost");
        assert!(email.html.contains("&lt;script&gt;"));
        assert!(!email.html.contains("<script>"));
    }
}
