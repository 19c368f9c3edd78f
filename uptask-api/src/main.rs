//! # UpTask API Server
//!
//! REST API for projects, tasks, notes and project teams, with email-based
//! account confirmation and JWT sessions.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/uptask JWT_SECRET=... cargo run -p uptask-api
//! ```

use std::{sync::Arc, time::Duration};

use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uptask_api::{
    app::{build_router, AppState},
    config::Config,
};
use uptask_shared::{
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    mail::{HttpMailer, LogMailer, Mailer},
    models::token::Token,
};

const TOKEN_SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "uptask_api=debug,uptask_shared=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("UpTask API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..DatabaseConfig::default()
    })
    .await?;

    run_migrations(&pool).await?;

    let mailer: Arc<dyn Mailer> = match config.mail.http_api() {
        Some((url, key)) => {
            tracing::info!(api_url = url, "Sending email through HTTP API");
            Arc::new(HttpMailer::new(url, key, config.mail.from.clone())?)
        }
        None => {
            tracing::warn!("MAIL_API_URL / MAIL_API_KEY not set, emails will only be logged");
            Arc::new(LogMailer::new(config.mail.from.clone()))
        }
    };

    let sweeper = tokio::spawn(sweep_expired_tokens(pool.clone()));

    let address = config.bind_address();
    let state = AppState::new(pool.clone(), config, mailer);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}

/// Deletes expired one-time codes every [`TOKEN_SWEEP_INTERVAL`]
async fn sweep_expired_tokens(pool: PgPool) {
    let mut interval = tokio::time::interval(TOKEN_SWEEP_INTERVAL);

    loop {
        interval.tick().await;

        match Token::purge_expired(&pool).await {
            Ok(0) => {}
            Ok(purged) => tracing::debug!(purged, "Expired tokens swept"),
            Err(e) => tracing::warn!(error = %e, "Token sweep failed"),
        }
    }
}
