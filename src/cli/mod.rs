//! Command-line interface for anilink.

use clap::{Parser, Subcommand};

/// anilink - anime title aggregation backend
#[derive(Parser)]
#[command(name = "anilink")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Commands {
    /// Apply migrations and run the HTTP API (default)
    #[default]
    Serve,

    /// Apply pending database migrations and exit
    Migrate,

    /// Load and validate settings from the environment
    CheckConfig,
}
