/// Configuration management for the API server
///
/// Configuration is read from environment variables (a `.env` file is
/// loaded first when present).
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 4000)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, `*` for any (default: *)
/// - `FRONTEND_URL`: Base URL used in email links (default: http://localhost:5173)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Session signing secret, at least 32 characters (required)
/// - `JWT_EXPIRATION_DAYS`: Session lifetime (default: 180)
/// - `MAIL_FROM`: Sender address (default: UpTask <admin@uptask.com>)
/// - `MAIL_API_URL`, `MAIL_API_KEY`: Email API; both set enables HTTP delivery
///
/// # Example
///
/// ```no_run
/// use uptask_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;
use uptask_shared::auth::jwt::DEFAULT_SESSION_DAYS;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,

    pub database: DatabaseConfig,

    pub jwt: JwtConfig,

    pub mail: MailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,

    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Frontend base URL, used for links in emails
    pub frontend_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Session signing secret
    ///
    /// Must be at least 32 bytes. Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Session lifetime in days
    pub expiration_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    pub from: String,

    pub api_url: Option<String>,

    pub api_key: Option<String>,
}

impl MailConfig {
    /// URL and key of the email API, when both are configured
    pub fn http_api(&self) -> Option<(&str, &str)> {
        match (&self.api_url, &self.api_key) {
            (Some(url), Some(key)) => Some((url.as_str(), key.as_str())),
            _ => None,
        }
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `DATABASE_URL` or `JWT_SECRET` is missing
    /// - `JWT_SECRET` is shorter than 32 characters
    /// - A numeric variable does not parse
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "4000".to_string())
            .parse::<u16>()?;

        let cors_origins = parse_origins(
            &env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()),
        );

        let frontend_url = env::var("FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:5173".to_string());

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let expiration_days = env::var("JWT_EXPIRATION_DAYS")
            .unwrap_or_else(|_| DEFAULT_SESSION_DAYS.to_string())
            .parse::<i64>()?;

        if expiration_days <= 0 {
            anyhow::bail!("JWT_EXPIRATION_DAYS must be positive");
        }

        let mail_from = env::var("MAIL_FROM")
            .unwrap_or_else(|_| "UpTask <admin@uptask.com>".to_string());

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
                frontend_url,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                expiration_days,
            },
            mail: MailConfig {
                from: mail_from,
                api_url: optional_var("MAIL_API_URL"),
                api_key: optional_var("MAIL_API_KEY"),
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn session_lifetime(&self) -> chrono::Duration {
        chrono::Duration::days(self.jwt.expiration_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 4000,
                cors_origins: vec!["*".to_string()],
                frontend_url: "http://localhost:5173".to_string(),
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                max_connections: 10,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
                expiration_days: 180,
            },
            mail: MailConfig {
                from: "UpTask <admin@uptask.com>".to_string(),
                api_url: None,
                api_key: None,
            },
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(config().bind_address(), "127.0.0.1:4000");
    }

    #[test]
    fn test_session_lifetime() {
        assert_eq!(config().session_lifetime().num_days(), 180);
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins("http://a.dev, http://b.dev ,,"),
            vec!["http://a.dev".to_string(), "http://b.dev".to_string()]
        );
        assert_eq!(parse_origins("*"), vec!["*".to_string()]);
    }

    #[test]
    fn test_mail_http_api_requires_url_and_key() {
        let mut mail = config().mail;
        assert!(mail.http_api().is_none());

        mail.api_url = Some("https://mail.example.com/send".to_string());
        assert!(mail.http_api().is_none());

        mail.api_key = Some("key".to_string());
        assert_eq!(
            mail.http_api(),
            Some(("https://mail.example.com/send", "key"))
        );
    }
}
