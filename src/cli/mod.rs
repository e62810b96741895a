use std::net::SocketAddr;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::app::{app, AppState};
use crate::auth::password::hash_password;
use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::services::FileVault;

#[derive(Parser)]
#[command(name = "cdmis-api")]
#[command(about = "CDMIS records management API server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve,

    #[command(about = "Apply pending database migrations and exit")]
    Migrate,

    #[command(about = "Print a bcrypt hash for seeding an account")]
    HashPassword {
        #[arg(help = "Plain-text password to hash")]
        password: String,
    },
}

pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Migrate => migrate(&config).await,
        Commands::HashPassword { password } => {
            let hash = hash_password(&password, config.security.bcrypt_cost).await?;
            println!("{}", hash);
            Ok(())
        }
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    config.validate().context("invalid configuration")?;

    let vault = FileVault::new(&config.upload)
        .with_context(|| format!("cannot prepare upload directory {}", config.upload.dir.display()))?;
    // Connections open on first use so the server starts (degraded) without a database
    let pool = DatabaseManager::connect_lazy(&config.database)?;

    let bind_addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!(
        "CDMIS API listening on http://{}{} ({:?})",
        bind_addr,
        config.server.api_prefix,
        config.environment
    );

    let state = AppState::new(config, pool.clone(), vault);
    axum::serve(listener, app(state).into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    DatabaseManager::close(pool).await;
    Ok(())
}

async fn migrate(config: &AppConfig) -> anyhow::Result<()> {
    let pool = DatabaseManager::connect(&config.database).await?;
    DatabaseManager::migrate(&pool).await?;
    DatabaseManager::close(pool).await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
