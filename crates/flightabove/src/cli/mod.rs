//! Command-line interface for the `flightabove` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, LocationCommand, NearbyCommand, PollArgs, SettingsCommand, WatchCommand,
};

/// flightabove - What's flying over you right now
///
/// Resolves your approximate location and lists the aircraft closest to it,
/// nearest first.
#[derive(Debug, Parser)]
#[command(name = "flightabove")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the flights nearest to you
    Nearby(NearbyCommand),

    /// Poll continuously until Ctrl-C
    Watch(WatchCommand),

    /// Show where the location resolver thinks you are
    Location(LocationCommand),

    /// View or change saved flight settings
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.verbose, self.quiet)
    }
}
