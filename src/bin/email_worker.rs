// src/bin/email_worker.rs
//
// Drains the `email_jobs` queue filled by registration in queue mode.

use std::time::Duration;

use blog_backend::bootstrap::{build_mailer, connect_pool, init_tracing};
use blog_backend::config::Config;
use blog_backend::queue::run_worker;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(about = "Delivers queued activation emails")]
struct Args {
    /// Seconds to wait before polling an empty queue again.
    #[arg(long, env = "EMAIL_WORKER_POLL_SECS", default_value_t = 2)]
    poll_secs: u64,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let config = Config::from_env();
    let _guard = init_tracing(&config, "email_worker.log");

    let pool = connect_pool(&config)
        .await
        .unwrap_or_else(|e| panic!("Failed to connect to database: {}", e));

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    let mailer = build_mailer(&config).expect("Failed to configure mailer");

    tokio::select! {
        _ = run_worker(pool, mailer.as_ref(), Duration::from_secs(args.poll_secs)) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Email worker shutting down");
        }
    }
}
