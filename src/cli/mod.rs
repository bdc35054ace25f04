//! CLI module for Chatlane
//!
//! Provides the `serve` subcommand that runs the HTTP API.

pub mod serve;

use clap::{Parser, Subcommand};

/// Chatlane - Multi-tenant chatbot backend with retrieval-augmented answers
#[derive(Parser)]
#[command(name = "chatlane")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,
}
