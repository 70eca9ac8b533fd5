//! Command-line interface for Anonymail.

use clap::{Parser, Subcommand};

/// Anonymail - account-backed proxy for DuckDuckGo email aliases
#[derive(Parser)]
#[command(name = "anonymail")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    #[command(alias = "web")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}
