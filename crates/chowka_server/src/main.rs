//! Chowka service entry point.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use chowka::{BoardSize, build_traverse_path, render_path};
use chowka_server::{AppState, GameManager, GameRepository, ServerConfig, router};
use clap::Parser;
use cli::{Cli, Command};
use std::sync::Arc;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = ServerConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve {
            host,
            port,
            db_path,
        } => run_server(config.with_overrides(host, port, db_path)).await,
        Command::Migrate { db_path } => run_migrations(config.with_overrides(None, None, db_path)),
        Command::Path { size, entry } => {
            let size = BoardSize::new(size)?;
            let path = build_traverse_path(size, entry);
            println!("{}", render_path(size, &path));
            Ok(())
        }
    }
}

/// Run the HTTP game server
#[instrument(skip(config), fields(host = %config.host(), port = config.port()))]
async fn run_server(config: ServerConfig) -> Result<()> {
    let repository = GameRepository::new(config.db_path().clone())?;
    repository.run_migrations()?;

    let manager = GameManager::new(Arc::new(repository.clone()), *config.max_board_size());
    let app = router(AppState {
        manager,
        repository,
    });

    let listener = tokio::net::TcpListener::bind((config.host().as_str(), *config.port())).await?;
    info!(address = %listener.local_addr()?, "Server ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Apply pending migrations
#[instrument(skip(config), fields(db_path = %config.db_path()))]
fn run_migrations(config: ServerConfig) -> Result<()> {
    let repository = GameRepository::new(config.db_path().clone())?;
    let applied = repository.run_migrations()?;
    println!("Applied {applied} migration(s) to {}", config.db_path());
    Ok(())
}
