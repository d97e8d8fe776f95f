// src/bootstrap.rs
//
// Startup pieces shared by the server and the binaries in `src/bin`.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    config::Config,
    error::AppError,
    mailer::{LogMailer, Mailer, SmtpMailer},
};

const CONNECT_RETRIES: u32 = 5;

/// Installs stdout and daily-rolling file logging (`logs/<file_name>`).
/// Keep the returned guard alive or buffered file output is lost.
pub fn init_tracing(config: &Config, file_name: &str) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily("logs", file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    guard
}

/// Connects with bounded acquire and per-statement timeouts, retrying while
/// the database is still coming up.
pub async fn connect_pool(config: &Config) -> Result<PgPool, sqlx::Error> {
    let options = PgConnectOptions::from_str(&config.database_url)?
        .options([("statement_timeout", config.statement_timeout_ms.to_string())]);

    let mut retry_count = 0;
    loop {
        match PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(3))
            .connect_with(options.clone())
            .await
        {
            Ok(pool) => return Ok(pool),
            Err(e) => {
                retry_count += 1;
                if retry_count > CONNECT_RETRIES {
                    return Err(e);
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }
}

/// SMTP when `SMTP_HOST` is set, otherwise a mailer that only logs.
pub fn build_mailer(config: &Config) -> Result<Arc<dyn Mailer>, AppError> {
    match &config.smtp {
        Some(smtp) => {
            tracing::info!(host = %smtp.host, port = smtp.port, "Using SMTP mailer");
            Ok(Arc::new(SmtpMailer::new(smtp, &config.mail_from)?))
        }
        None => {
            tracing::warn!("SMTP_HOST not set, activation emails will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}
