//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::geo::Coordinate;
use crate::settings::SettingsPatch;

/// Arguments shared by the polling commands.
#[derive(Debug, Clone, Default, Args)]
pub struct PollArgs {
    /// Use synthetic flights instead of the live provider
    #[arg(long)]
    pub demo: bool,

    /// Maximum number of flights to show
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Search radius in kilometers
    #[arg(short, long)]
    pub radius: Option<f64>,

    /// Latitude to search around instead of the resolved location
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude to search around instead of the resolved location
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,
}

impl PollArgs {
    /// Settings overrides for this run only.
    #[must_use]
    pub fn overrides(&self) -> SettingsPatch {
        SettingsPatch {
            max_flights_per_request: self.limit,
            radius_km: self.radius,
            demo_mode: self.demo.then_some(true),
            ..SettingsPatch::default()
        }
    }

    /// The explicit search center, if both coordinates were given.
    #[must_use]
    pub fn center(&self) -> Option<Coordinate> {
        Some(Coordinate::new(self.lat?, self.lon?))
    }
}

/// Show flights near you once.
#[derive(Debug, Args)]
pub struct NearbyCommand {
    /// Polling overrides
    #[command(flatten)]
    pub poll: PollArgs,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Keep polling and print each result until interrupted.
#[derive(Debug, Args)]
pub struct WatchCommand {
    /// Polling overrides
    #[command(flatten)]
    pub poll: PollArgs,

    /// Print each poll as one JSON line
    #[arg(short, long)]
    pub json: bool,
}

/// Show the resolved location.
#[derive(Debug, Args)]
pub struct LocationCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Saved flight settings commands.
#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Show the effective settings
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Change and save one setting
    Set {
        /// Setting name, e.g. radius_km
        key: String,

        /// New value
        value: String,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
