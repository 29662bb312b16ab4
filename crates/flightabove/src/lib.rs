//! `flightabove` - find the aircraft flying closest to you
//!
//! The library resolves an approximate user location, fetches live aircraft
//! positions (or synthesizes demo traffic), ranks them by great-circle
//! distance and normalizes heterogeneous provider records into one
//! [`Flight`] shape. [`FlightService`] ties the pieces together and
//! [`scheduler::Poller`] runs it on a timer.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cache;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod flight;
pub mod geo;
pub mod http;
pub mod location;
pub mod logging;
pub mod provider;
pub mod ranking;
pub mod scheduler;
pub mod service;
pub mod settings;
pub mod usage;

pub use config::Config;
pub use error::{Error, Result};
pub use flight::{Flight, FlightStatus, RawFlightRecord};
pub use geo::Coordinate;
pub use logging::init_logging;
pub use provider::{ProviderError, ProviderErrorKind};
pub use service::FlightService;
pub use settings::{FlightServiceSettings, SettingsPatch};
