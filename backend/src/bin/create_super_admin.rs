//! Seed the first super admin account into the PostgreSQL roster.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io;
use std::sync::Arc;

use chrono::TimeDelta;
use clap::Parser;
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use fleet_tracker::domain::{AccountService, Email, Password, SuperAdminBootstrap, UserName};
use fleet_tracker::outbound::persistence::{
    DbPool, DieselUserRepository, PoolConfig, run_pending_migrations,
};
use fleet_tracker::outbound::security::{Argon2PasswordHasher, JwtTokenService, TokenSecret};
use fleet_tracker::settings::AppSettings;

/// `create-super-admin` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "create-super-admin",
    about = "Create or promote the first super admin account",
    version
)]
struct CliArgs {
    /// Login email of the account.
    #[arg(long, env = "SUPER_ADMIN_EMAIL", value_name = "email")]
    email: String,
    /// Initial password; ignored when an existing account is promoted.
    #[arg(long, env = "SUPER_ADMIN_PASSWORD", value_name = "password", hide_env_values = true)]
    password: String,
    /// Display name for a newly created account.
    #[arg(
        long,
        env = "SUPER_ADMIN_NAME",
        value_name = "name",
        default_value = "Super Administrator"
    )]
    name: String,
}

fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let email = Email::new(&args.email).map_err(invalid_input)?;
    let password = Password::new(&args.password).map_err(invalid_input)?;
    let name = UserName::new(&args.name).map_err(invalid_input)?;

    // Database settings come from the same TRACKER_* variables as the server.
    let settings = AppSettings::load_from_iter([OsString::from("create-super-admin")])
        .map_err(|error| io::Error::other(format!("load configuration: {error}")))?;
    let database_url = settings
        .database_url()
        .map_err(io::Error::other)?
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "TRACKER_DB_HOST must be set to seed a super admin",
            )
        })?;

    let migration_url = database_url.clone();
    let applied = tokio::task::spawn_blocking(move || run_pending_migrations(&migration_url))
        .await
        .map_err(|error| io::Error::other(format!("migration task failed: {error}")))?
        .map_err(io::Error::other)?;
    info!(applied, "database schema up to date");

    let pool = DbPool::new(PoolConfig::new(database_url).with_max_size(2))
        .await
        .map_err(|error| io::Error::other(format!("create database pool: {error}")))?;
    let clock = Arc::new(DefaultClock);
    // Bootstrapping never issues tokens; the secret only satisfies the service.
    let tokens = JwtTokenService::new(&TokenSecret::ephemeral(), TimeDelta::minutes(1), clock);
    let accounts = AccountService::new(
        Arc::new(DieselUserRepository::new(pool)),
        Arc::new(Argon2PasswordHasher),
        Arc::new(tokens),
    );

    let outcome = accounts
        .bootstrap_super_admin(email.clone(), &password, name)
        .await
        .map_err(|error| io::Error::other(format!("bootstrap failed: {error}")))?;

    match outcome {
        SuperAdminBootstrap::AlreadyPresent => {
            warn!(%email, "a super admin already exists; nothing changed");
        }
        SuperAdminBootstrap::Promoted(user) => {
            info!(id = %user.id, email = %user.email, "existing account promoted to super admin");
        }
        SuperAdminBootstrap::Created(user) => {
            info!(
                id = %user.id,
                email = %user.email,
                name = %user.name,
                "super admin created"
            );
        }
    }
    Ok(())
}

fn invalid_input(error: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, error.to_string())
}
