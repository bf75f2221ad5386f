//! Command-line interface for the callvault daemon and maintenance tasks.

use clap::{Parser, Subcommand};

/// Callvault - credential vault service for call-center CRM deployments
#[derive(Parser)]
#[command(name = "callvault")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as background daemon with the session expiry scheduler
    #[command(alias = "-d", alias = "--daemon")]
    Daemon,

    /// Run a single session expiry sweep and exit
    Sweep,

    /// Generate a fresh 256-bit master key (hex encoded) and print it
    #[command(name = "gen-key")]
    GenKey,

    /// Write a default config.toml if none exists
    #[command(alias = "--init")]
    Init,
}
