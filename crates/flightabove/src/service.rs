//! The flight data orchestrator.
//!
//! [`FlightService`] owns everything a poll needs: settings, the provider,
//! the location resolver, usage accounting and the results of the last
//! poll. A poll either synthesizes demo flights or calls the live provider,
//! then ranks, optionally enriches and normalizes the records.
//!
//! Provider failures never escape a poll. They are classified, kept as
//! [`FlightService::last_error`], and the poll returns no flights.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::credentials::{CredentialStore, StaticCredentialStore};
use crate::error::Result;
use crate::flight::{normalize_ranked, Flight, RawFlightRecord};
use crate::geo::{BoundingBox, Coordinate};
use crate::http::HttpFetch;
use crate::location::LocationResolver;
use crate::provider::{demo, EndpointTier, FlightProvider, Fr24Client, ProviderError, RouteEnricher};
use crate::ranking::rank_nearby;
use crate::settings::{FlightServiceSettings, JsonSettingsStore, SettingsPatch, SettingsStore};
use crate::usage::{CreditCosts, UsageLog, UsageRecord};

/// Fixed knobs that do not change at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceOptions {
    /// Credits charged per returned item.
    pub costs: CreditCosts,
    /// Fewest flights a demo poll produces.
    pub demo_min_flights: usize,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            costs: CreditCosts::default(),
            demo_min_flights: 3,
        }
    }
}

/// Polls for nearby flights and keeps the latest results.
#[derive(Debug)]
pub struct FlightService {
    provider: Box<dyn FlightProvider>,
    enricher: Option<RouteEnricher>,
    credentials: Arc<dyn CredentialStore>,
    store: Box<dyn SettingsStore>,
    location: LocationResolver,
    options: ServiceOptions,
    settings: RwLock<FlightServiceSettings>,
    last_results: RwLock<Vec<Flight>>,
    last_error: RwLock<Option<ProviderError>>,
    usage: Mutex<UsageLog>,
    /// Held while a poll runs; holds what the most recent poll returned.
    poll_lock: tokio::sync::Mutex<Vec<Flight>>,
    refresh: Notify,
}

impl FlightService {
    /// Assemble a service from its collaborators.
    ///
    /// `settings` is the starting point; anything saved in `store` replaces it.
    #[must_use]
    pub fn new(
        provider: Box<dyn FlightProvider>,
        credentials: Arc<dyn CredentialStore>,
        store: Box<dyn SettingsStore>,
        location: LocationResolver,
        settings: FlightServiceSettings,
        options: ServiceOptions,
    ) -> Self {
        let settings = match store.load() {
            Ok(Some(saved)) if saved.validate().is_ok() => saved,
            Ok(Some(_)) => {
                warn!("saved settings are invalid; using configured settings");
                settings
            }
            Ok(None) => settings,
            Err(e) => {
                warn!(error = %e, "failed to load saved settings; using configured settings");
                settings
            }
        };

        Self {
            provider,
            enricher: None,
            credentials,
            store,
            location,
            options,
            settings: RwLock::new(settings),
            last_results: RwLock::new(Vec::new()),
            last_error: RwLock::new(None),
            usage: Mutex::new(UsageLog::default()),
            poll_lock: tokio::sync::Mutex::new(Vec::new()),
            refresh: Notify::new(),
        }
    }

    /// Use `enricher` when the `enrich_routes` setting is on.
    #[must_use]
    pub fn with_enricher(mut self, enricher: RouteEnricher) -> Self {
        self.enricher = Some(enricher);
        self
    }

    /// Wire up the production collaborators from configuration.
    #[must_use]
    pub fn from_config(config: &Config, http: &Arc<dyn HttpFetch>) -> Self {
        let provider = Fr24Client::new(Arc::clone(http), config.provider.base_url.clone())
            .with_timeout(config.provider_timeout());
        let enricher = RouteEnricher::new(
            Arc::clone(http),
            config.enrichment.base_url.clone(),
            config.enrichment_ttl(),
        )
        .with_timeout(config.enrichment_timeout());

        Self::new(
            Box::new(provider),
            Arc::new(StaticCredentialStore::new(config.provider.api_token.clone())),
            Box::new(JsonSettingsStore::new(config.settings_path())),
            LocationResolver::from_config(&config.location, http),
            config.flights.clone(),
            ServiceOptions {
                costs: config.provider.credits,
                demo_min_flights: config.demo.min_flights,
            },
        )
        .with_enricher(enricher)
    }

    /// Resolve the current location and poll around it.
    pub async fn refresh(&self) -> Vec<Flight> {
        let location = self.current_location().await;
        self.fetch_flights(&location).await
    }

    /// Resolve the user's location. Never fails.
    pub async fn current_location(&self) -> Coordinate {
        self.location.current_location().await
    }

    /// Poll for flights around `reference`.
    ///
    /// Only one poll runs at a time. A call that arrives while a poll is in
    /// flight waits for it and returns exactly what that poll returned,
    /// including an empty list when it failed.
    pub async fn fetch_flights(&self, reference: &Coordinate) -> Vec<Flight> {
        let Ok(mut latest) = self.poll_lock.try_lock() else {
            debug!("poll already in flight; waiting for its results");
            return self.poll_lock.lock().await.clone();
        };

        let flights = self.poll(reference).await;
        latest.clone_from(&flights);
        flights
    }

    async fn poll(&self, reference: &Coordinate) -> Vec<Flight> {
        let settings = self.settings();
        if settings.demo_mode {
            return self.poll_demo(reference, &settings);
        }

        let Some(credential) = self.credentials.credential() else {
            debug!("no API credential configured; skipping live poll");
            return Vec::new();
        };

        match self.poll_live(&credential, reference, &settings).await {
            Ok(flights) => flights,
            Err(e) => {
                warn!(kind = ?e.kind, status = ?e.status, error = %e, "live poll failed");
                *self.last_error.write() = Some(e);
                Vec::new()
            }
        }
    }

    fn poll_demo(&self, reference: &Coordinate, settings: &FlightServiceSettings) -> Vec<Flight> {
        let raws = {
            let mut rng = rand::rng();
            let count = demo::flight_count(
                &mut rng,
                self.options.demo_min_flights,
                settings.max_flights_per_request,
            );
            demo::synthesize(&mut rng, reference, settings.radius_km, count)
        };

        let flights: Vec<Flight> = rank_nearby(&raws, reference, settings.radius_km, raws.len())
            .into_iter()
            .map(|(raw, distance)| normalize_ranked(raw, distance))
            .collect();

        info!(count = flights.len(), "generated demo flights");
        self.record_usage(raws.len(), settings.tier());
        *self.last_results.write() = flights.clone();
        flights
    }

    async fn poll_live(
        &self,
        credential: &str,
        reference: &Coordinate,
        settings: &FlightServiceSettings,
    ) -> std::result::Result<Vec<Flight>, ProviderError> {
        let tier = settings.tier();
        let bounds = BoundingBox::around(reference, settings.radius_km);
        let raws = self
            .provider
            .fetch_positions(credential, &bounds, tier, settings.max_flights_per_request)
            .await?;
        let returned = raws.len();

        let (ranked, distances): (Vec<RawFlightRecord>, Vec<f64>) = rank_nearby(
            &raws,
            reference,
            settings.radius_km,
            settings.max_flights_per_request,
        )
        .into_iter()
        .map(|(raw, distance)| (raw.clone(), distance))
        .unzip();

        let ranked = match &self.enricher {
            Some(enricher) if settings.enrich_routes => {
                enricher
                    .enrich(ranked, settings.max_flights_per_request)
                    .await
            }
            _ => ranked,
        };

        let flights: Vec<Flight> = ranked
            .iter()
            .zip(distances)
            .map(|(raw, distance)| normalize_ranked(raw, distance))
            .collect();

        info!(
            provider = self.provider.name(),
            returned,
            nearby = flights.len(),
            "live poll complete"
        );
        self.record_usage(returned, tier);
        *self.last_error.write() = None;
        *self.last_results.write() = flights.clone();
        Ok(flights)
    }

    fn record_usage(&self, items: usize, tier: EndpointTier) {
        let record = UsageRecord::new(items, tier, &self.options.costs, now_ms());
        debug!(items, credits = record.credits_used, %tier, "recorded usage");
        self.usage.lock().push(record);
    }

    /// Flights from the most recent successful poll.
    #[must_use]
    pub fn last_results(&self) -> Vec<Flight> {
        self.last_results.read().clone()
    }

    /// Current settings.
    #[must_use]
    pub fn settings(&self) -> FlightServiceSettings {
        self.settings.read().clone()
    }

    /// Apply and persist a settings change.
    ///
    /// Turning demo mode on requests an immediate re-poll.
    ///
    /// # Errors
    ///
    /// Returns an error if the merged settings are invalid or cannot be
    /// saved. The running settings are only replaced after a successful save.
    pub fn update_settings(&self, patch: &SettingsPatch) -> Result<FlightServiceSettings> {
        self.apply_settings(patch, true)
    }

    /// Apply a settings change for this process without saving it.
    ///
    /// Unlike [`FlightService::update_settings`] this never requests a
    /// refresh; the next scheduled poll picks the change up.
    ///
    /// # Errors
    ///
    /// Returns an error if the merged settings are invalid.
    pub fn override_settings(&self, patch: &SettingsPatch) -> Result<FlightServiceSettings> {
        self.apply_settings(patch, false)
    }

    fn apply_settings(
        &self,
        patch: &SettingsPatch,
        persist: bool,
    ) -> Result<FlightServiceSettings> {
        let mut settings = self.settings.write();
        let updated = settings.merged(patch);
        updated.validate()?;
        if persist {
            self.store.save(&updated)?;
        }

        // Run-only overrides are applied before any poller exists.
        let demo_enabled = persist && updated.demo_mode && !settings.demo_mode;
        *settings = updated.clone();
        drop(settings);

        info!(?patch, persist, "settings updated");
        if demo_enabled {
            self.request_refresh();
        }
        Ok(updated)
    }

    /// Ask the poller to run now.
    pub fn request_refresh(&self) {
        self.refresh.notify_one();
    }

    /// Wait until a refresh is requested.
    pub async fn refresh_requested(&self) {
        self.refresh.notified().await;
    }

    /// Retained usage records, oldest first.
    #[must_use]
    pub fn usage_history(&self) -> Vec<UsageRecord> {
        self.usage.lock().history()
    }

    /// Credits used in the last hour.
    #[must_use]
    pub fn hourly_usage(&self) -> u64 {
        self.usage.lock().hourly_at(now_ms())
    }

    /// Credits used in the last day.
    #[must_use]
    pub fn daily_usage(&self) -> u64 {
        self.usage.lock().daily_at(now_ms())
    }

    /// Projected credits for a 30-day month.
    #[must_use]
    pub fn estimate_monthly_usage(&self) -> u64 {
        let settings = self.settings();
        self.usage
            .lock()
            .estimate_monthly_at(now_ms(), &settings, &self.options.costs)
    }

    /// The last provider failure, if it has not been cleared.
    #[must_use]
    pub fn last_error(&self) -> Option<ProviderError> {
        self.last_error.read().clone()
    }

    /// Forget the last provider failure.
    pub fn clear_error(&self) {
        *self.last_error.write() = None;
    }

    /// Whether a provider credential is available.
    #[must_use]
    pub fn has_credential(&self) -> bool {
        self.credentials.has_credential()
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
