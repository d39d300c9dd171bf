//! TutorMatch API - main entry point
//!
//! Resolves configuration, opens (and migrates) the database, loads the
//! token secret and serves the HTTP API until Ctrl+C / SIGTERM.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tutormatch_api::{build_router, seed, AppState};
use tutormatch_common::auth::load_token_secret;
use tutormatch_common::config::{ConfigOverrides, ServiceConfig};
use tutormatch_common::db::init_database;

/// Command-line arguments for tutormatch-api
#[derive(Parser, Debug)]
#[command(name = "tutormatch-api")]
#[command(about = "Music tutor marketplace API")]
#[command(version)]
struct Args {
    /// TOML config file (default: <config dir>/tutormatch/config.toml)
    #[arg(short, long, env = "TUTORMATCH_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(short, long, env = "TUTORMATCH_DATABASE")]
    database: Option<PathBuf>,

    /// Address to bind
    #[arg(short, long, env = "TUTORMATCH_BIND")]
    bind: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "TUTORMATCH_PORT")]
    port: Option<u16>,

    /// Bearer token signing secret (generated and stored when absent)
    #[arg(long, env = "TUTORMATCH_TOKEN_SECRET", hide_env_values = true)]
    token_secret: Option<String>,

    /// Insert demo users and tutor profiles before serving
    #[arg(long)]
    seed_demo: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_file: self.config.clone(),
            database_path: self.database.clone(),
            bind_address: self.bind.clone(),
            port: self.port,
            token_secret: self.token_secret.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ServiceConfig::resolve(&args.overrides()).context("Failed to resolve configuration")?;

    // RUST_LOG wins over the configured filter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting TutorMatch API v{}", env!("CARGO_PKG_VERSION"));
    info!("Database path: {}", config.database_path.display());

    let pool = init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;
    info!("Database ready");

    let token_secret = match &config.token_secret {
        Some(secret) => {
            info!("Using configured token secret");
            secret.clone()
        }
        None => load_token_secret(&pool)
            .await
            .context("Failed to load token secret")?,
    };

    if args.seed_demo {
        seed::seed_demo_data(&pool, &token_secret)
            .await
            .context("Failed to seed demo data")?;
    }

    let state = AppState::new(pool, token_secret);
    let app = build_router(state);

    let addr = config.listen_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("TutorMatch API listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
