//! Command-line interface for the chowka service.

use chowka::EntryPoint;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Chowka - stick-dice cross-board game service
#[derive(Parser, Debug)]
#[command(name = "chowka")]
#[command(about = "REST service for four-player stick-dice games", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file (defaults to ./chowka.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP game server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to the database file (created if it doesn't exist)
        #[arg(long)]
        db_path: Option<String>,
    },

    /// Apply pending database migrations and exit
    Migrate {
        /// Path to the database file (created if it doesn't exist)
        #[arg(long)]
        db_path: Option<String>,
    },

    /// Print the step index of every cell of a traverse path
    Path {
        /// Board side length (odd, at least 5)
        #[arg(short, long, default_value_t = 5)]
        size: usize,

        /// Entry point the path starts from
        #[arg(short, long, default_value = "top")]
        entry: EntryPoint,
    },
}
