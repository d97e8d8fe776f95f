// src/main.rs

use std::net::SocketAddr;

use blog_backend::bootstrap::{build_mailer, connect_pool, init_tracing};
use blog_backend::config::Config;
use blog_backend::error::AppError;
use blog_backend::models::user::UserRole;
use blog_backend::routes;
use blog_backend::state::AppState;
use blog_backend::store::users;
use blog_backend::utils::hash::hash_password;
use blog_backend::utils::jwt::SessionKeys;
use blog_backend::utils::validation::normalize_email;
use sqlx::PgPool;

#[tokio::main]
async fn main() {
    // Load configuration from environment (.env included)
    let config = Config::from_env();

    // Initialize Tracing (Logging)
    let _guard = init_tracing(&config, "app.log");

    // Initialize Database Pool with Retry
    let pool = connect_pool(&config)
        .await
        .unwrap_or_else(|e| panic!("Failed to connect to database: {}", e));

    tracing::info!("Database connected...");

    // Run Migrations Automatically
    tracing::info!("Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations applied successfully.");

    // Seed Admin User
    if let Err(e) = seed_admin_user(&pool, &config).await {
        tracing::error!("Failed to seed admin user: {:?}", e);
    }

    let mailer = build_mailer(&config).expect("Failed to configure mailer");

    // Create AppState
    let state = AppState {
        pool: pool.clone(),
        keys: SessionKeys::new(config.jwt_secret.as_bytes(), config.jwt_expiration),
        config: config.clone(),
        mailer,
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(
        email_delivery = ?config.email_delivery,
        "Listening on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listening address");

    // Start the server
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}

async fn seed_admin_user(pool: &PgPool, config: &Config) -> Result<(), AppError> {
    if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
        let email = normalize_email(email);
        if users::get_verified_user_by_email(pool, &email).await?.is_none() {
            tracing::info!("Seeding admin user: {}", email);
            let hashed_password = hash_password(password)?;
            users::create_verified_user(pool, &email, &hashed_password, UserRole::Admin).await?;
            tracing::info!("Admin user created successfully.");
        }
    }
    Ok(())
}
