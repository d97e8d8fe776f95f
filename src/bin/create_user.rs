// src/bin/create_user.rs
//
// Seeds a verified account without going through email activation.

use blog_backend::bootstrap::connect_pool;
use blog_backend::config::Config;
use blog_backend::error::AppError;
use blog_backend::models::user::UserRole;
use blog_backend::store::users;
use blog_backend::utils::hash::hash_password;
use blog_backend::utils::validation::{is_password_strong, is_valid_email, normalize_email};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(about = "Creates a verified user")]
struct Args {
    #[arg(long)]
    email: String,

    #[arg(long)]
    password: String,

    /// Give the user the admin role.
    #[arg(long)]
    admin: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.rust_log))
        .with_target(false)
        .init();

    if let Err(e) = run(&config, args).await {
        tracing::error!("Failed to create user: {:?}", e);
        std::process::exit(1);
    }
}

async fn run(config: &Config, args: Args) -> Result<(), AppError> {
    let email = normalize_email(&args.email);
    if !is_valid_email(&email) {
        return Err(AppError::BadRequest("invalid email".to_string()));
    }
    if !is_password_strong(args.password.trim()) {
        return Err(AppError::BadRequest("weak password".to_string()));
    }

    let pool = connect_pool(config).await?;
    let role = if args.admin {
        UserRole::Admin
    } else {
        UserRole::User
    };

    let hashed_password = hash_password(&args.password)?;
    let user = users::create_verified_user(&pool, &email, &hashed_password, role).await?;

    tracing::info!(user_id = user.id, email = %user.email, ?role, "User created");
    Ok(())
}
