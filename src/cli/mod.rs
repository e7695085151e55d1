//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{HistoryCommand, PlanCommand, RebuildCommand, ValidateCommand};

/// Resynchronize a checkout and rebuild its native artifact
#[derive(Debug, Parser, Clone)]
#[command(name = "rebuilder")]
#[command(author = "Rebuilder Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Resynchronize a checkout with its remote and rebuild a native artifact", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Pull, rebuild and reload the artifact
    Rebuild(RebuildCommand),

    /// Validate a rebuild configuration
    Validate(ValidateCommand),

    /// Print the commands a rebuild would run
    Plan(PlanCommand),

    /// Show rebuild history
    History(HistoryCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}

use std::ffi::OsString;
