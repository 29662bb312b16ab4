//! `flightabove` - CLI for finding the flights overhead
//!
//! Thin wrapper around [`flightabove::FlightService`]: builds it from
//! configuration, applies command-line overrides and prints the results.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use flightabove::cli::{
    Cli, Command, ConfigCommand, LocationCommand, NearbyCommand, PollArgs, SettingsCommand,
    WatchCommand,
};
use flightabove::http::{HttpFetch, ReqwestFetcher};
use flightabove::scheduler::Poller;
use flightabove::{init_logging, Config, Flight, FlightService, SettingsPatch};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> CliResult {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Nearby(cmd) => handle_nearby(&config, &cmd).await,
        Command::Watch(cmd) => handle_watch(&config, &cmd).await,
        Command::Location(cmd) => handle_location(&config, &cmd).await,
        Command::Settings(cmd) => handle_settings(&config, cmd),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn build_service(
    config: &Config,
    poll: &PollArgs,
) -> Result<Arc<FlightService>, Box<dyn std::error::Error>> {
    let http: Arc<dyn HttpFetch> = Arc::new(ReqwestFetcher::new()?);
    let service = FlightService::from_config(config, &http);

    let overrides = poll.overrides();
    if !overrides.is_empty() {
        service.override_settings(&overrides)?;
    }
    Ok(Arc::new(service))
}

fn hint_missing_token(service: &FlightService) {
    if !service.settings().demo_mode && !service.has_credential() {
        eprintln!("No API token configured; set FLIGHTABOVE_PROVIDER__API_TOKEN or use --demo.");
    }
}

fn report_error(service: &FlightService) {
    if let Some(err) = service.last_error() {
        eprintln!("Provider error: {err}");
        if let Some(url) = err.action_url() {
            eprintln!("  Manage your plan at {url}");
        }
    }
}

fn print_flights(flights: &[Flight]) {
    if flights.is_empty() {
        println!("No flights nearby.");
        return;
    }
    for flight in flights {
        println!("{}", flight.summary());
    }
}

async fn handle_nearby(config: &Config, cmd: &NearbyCommand) -> CliResult {
    let service = build_service(config, &cmd.poll)?;
    hint_missing_token(&service);
    let center = match cmd.poll.center() {
        Some(center) => center,
        None => service.current_location().await,
    };

    let flights = service.fetch_flights(&center).await;
    report_error(&service);

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&flights)?);
    } else {
        println!(
            "Flights near {:.4}, {:.4}",
            center.latitude, center.longitude
        );
        println!();
        print_flights(&flights);
    }
    Ok(())
}

async fn handle_watch(config: &Config, cmd: &WatchCommand) -> CliResult {
    let service = build_service(config, &cmd.poll)?;
    hint_missing_token(&service);
    let mut poller = Poller::new(Arc::clone(&service));
    if let Some(center) = cmd.poll.center() {
        poller = poller.with_center(center);
    }

    let cancel = CancellationToken::new();
    let (tx, mut rx) = mpsc::channel(1);
    let task = tokio::spawn({
        let cancel = cancel.clone();
        async move { poller.run(cancel, tx).await }
    });

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                cancel.cancel();
                break;
            }
            flights = rx.recv() => {
                let Some(flights) = flights else { break };
                report_error(&service);
                if cmd.json {
                    println!("{}", serde_json::to_string(&flights)?);
                } else {
                    println!(
                        "--- {} | {} credits this hour ---",
                        chrono::Local::now().format("%H:%M:%S"),
                        service.hourly_usage()
                    );
                    print_flights(&flights);
                }
            }
        }
    }

    task.await?;
    Ok(())
}

async fn handle_location(config: &Config, cmd: &LocationCommand) -> CliResult {
    let service = build_service(config, &PollArgs::default())?;
    let location = service.current_location().await;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&location)?);
    } else {
        println!("Latitude:  {:.4}", location.latitude);
        println!("Longitude: {:.4}", location.longitude);
        if location.accuracy_meters > 0.0 {
            println!("Accuracy:  ~{:.0} m", location.accuracy_meters);
        }
    }
    Ok(())
}

fn handle_settings(config: &Config, cmd: SettingsCommand) -> CliResult {
    let service = build_service(config, &PollArgs::default())?;

    let settings = match cmd {
        SettingsCommand::Show { json: true } => {
            println!("{}", serde_json::to_string_pretty(&service.settings())?);
            return Ok(());
        }
        SettingsCommand::Show { json: false } => service.settings(),
        SettingsCommand::Set { key, value } => {
            let mut patch = SettingsPatch::default();
            patch.set(&key, &value)?;
            let updated = service.update_settings(&patch)?;
            println!("Saved {key} = {value}");
            println!();
            updated
        }
    };

    println!("Flight Settings");
    println!("===============");
    println!("  refresh_interval_minutes: {}", settings.refresh_interval_minutes);
    println!("  max_flights_per_request:  {}", settings.max_flights_per_request);
    println!("  radius_km:                {}", settings.radius_km);
    println!("  use_full_endpoint:        {}", settings.use_full_endpoint);
    println!("  demo_mode:                {}", settings.demo_mode);
    println!("  enrich_routes:            {}", settings.enrich_routes);
    println!();
    println!(
        "Estimated monthly credits:  {}",
        service.estimate_monthly_usage()
    );
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> CliResult {
    match cmd {
        ConfigCommand::Show { json } => {
            let mut shown = config.clone();
            if shown.provider.api_token.is_some() {
                shown.provider.api_token = Some("<redacted>".to_string());
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Provider]");
                println!("  Base URL:           {}", shown.provider.base_url);
                println!(
                    "  API token:          {}",
                    shown.provider.api_token.as_deref().unwrap_or("(not set)")
                );
                println!("  Timeout (secs):     {}", shown.provider.timeout_secs);
                println!();
                println!("[Location]");
                println!("  Providers:          {}", shown.location.providers.join(", "));
                println!("  Freshness (mins):   {}", shown.location.freshness_minutes);
                println!();
                println!("[Enrichment]");
                println!("  Base URL:           {}", shown.enrichment.base_url);
                println!("  Cache TTL (mins):   {}", shown.enrichment.cache_ttl_minutes);
                println!();
                println!("[Storage]");
                println!("  Settings path:      {}", shown.settings_path().display());
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
