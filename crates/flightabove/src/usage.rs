//! API credit accounting.
//!
//! Every successful poll appends one [`UsageRecord`] to a bounded
//! [`UsageLog`]. Credits are charged per returned item at a per-tier rate.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::provider::EndpointTier;
use crate::settings::FlightServiceSettings;

/// Number of usage records retained.
pub const USAGE_HISTORY_CAPACITY: usize = 100;

const HOUR_MS: i64 = 60 * 60 * 1000;
const DAY_MS: i64 = 24 * HOUR_MS;
const HOURS_PER_MONTH: u64 = 24 * 30;
const MINUTES_PER_MONTH: u64 = 60 * HOURS_PER_MONTH;

/// Credits charged per returned item for each endpoint tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditCosts {
    /// Credits per item on the light endpoint.
    pub light: u64,
    /// Credits per item on the full endpoint.
    pub full: u64,
}

impl Default for CreditCosts {
    fn default() -> Self {
        Self { light: 6, full: 8 }
    }
}

impl CreditCosts {
    /// Per-item cost of `tier`.
    #[must_use]
    pub const fn for_tier(&self, tier: EndpointTier) -> u64 {
        match tier {
            EndpointTier::Light => self.light,
            EndpointTier::Full => self.full,
        }
    }
}

/// One successful poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Items the provider returned (and billed).
    pub items_returned: usize,
    /// Credits charged for the poll.
    pub credits_used: u64,
    /// Tier that was called.
    pub endpoint: EndpointTier,
    /// Unix time in milliseconds.
    pub timestamp_ms: i64,
}

impl UsageRecord {
    /// Build a record for a poll that happened at `timestamp_ms`.
    #[must_use]
    pub fn new(
        items_returned: usize,
        endpoint: EndpointTier,
        costs: &CreditCosts,
        timestamp_ms: i64,
    ) -> Self {
        Self {
            items_returned,
            credits_used: items_returned as u64 * costs.for_tier(endpoint),
            endpoint,
            timestamp_ms,
        }
    }
}

/// Bounded ring of recent usage records, oldest first.
#[derive(Debug, Clone)]
pub struct UsageLog {
    records: VecDeque<UsageRecord>,
    capacity: usize,
}

impl Default for UsageLog {
    fn default() -> Self {
        Self::with_capacity(USAGE_HISTORY_CAPACITY)
    }
}

impl UsageLog {
    /// Create a log holding at most `capacity` records.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a record, dropping the oldest when full.
    pub fn push(&mut self, record: UsageRecord) {
        if self.capacity == 0 {
            return;
        }
        while self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// All retained records, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<UsageRecord> {
        self.records.iter().cloned().collect()
    }

    /// Number of retained records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Credits used in the hour before `now_ms`.
    #[must_use]
    pub fn hourly_at(&self, now_ms: i64) -> u64 {
        self.credits_since(now_ms - HOUR_MS)
    }

    /// Credits used in the day before `now_ms`.
    #[must_use]
    pub fn daily_at(&self, now_ms: i64) -> u64 {
        self.credits_since(now_ms - DAY_MS)
    }

    /// Projected credits for a 30-day month.
    ///
    /// Extrapolates the last hour when it saw any polls; otherwise projects
    /// from the settings: polls per month times the maximum flights times the
    /// per-item cost of the configured tier.
    #[must_use]
    pub fn estimate_monthly_at(
        &self,
        now_ms: i64,
        settings: &FlightServiceSettings,
        costs: &CreditCosts,
    ) -> u64 {
        let cutoff = now_ms - HOUR_MS;
        if self.records.iter().any(|r| r.timestamp_ms > cutoff) {
            return self.hourly_at(now_ms) * HOURS_PER_MONTH;
        }

        let credits_per_poll =
            settings.max_flights_per_request as u64 * costs.for_tier(settings.tier());
        // Scale before dividing so intervals that do not divide an hour stay exact.
        MINUTES_PER_MONTH * credits_per_poll / u64::from(settings.refresh_interval_minutes.max(1))
    }

    fn credits_since(&self, cutoff_ms: i64) -> u64 {
        self.records
            .iter()
            .filter(|r| r.timestamp_ms > cutoff_ms)
            .map(|r| r.credits_used)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    fn record(items: usize, tier: EndpointTier, at: i64) -> UsageRecord {
        UsageRecord::new(items, tier, &CreditCosts::default(), at)
    }

    #[test]
    fn test_credits_per_tier() {
        assert_eq!(record(5, EndpointTier::Light, NOW).credits_used, 30);
        assert_eq!(record(5, EndpointTier::Full, NOW).credits_used, 40);
        assert_eq!(record(0, EndpointTier::Full, NOW).credits_used, 0);
    }

    #[test]
    fn test_custom_costs() {
        let costs = CreditCosts { light: 1, full: 3 };
        assert_eq!(costs.for_tier(EndpointTier::Full), 3);
        assert_eq!(UsageRecord::new(4, EndpointTier::Full, &costs, NOW).credits_used, 12);
    }

    #[test]
    fn test_hourly_sum() {
        let mut log = UsageLog::default();
        for i in 0..3 {
            log.push(record(2, EndpointTier::Full, NOW - i * 60_000));
        }
        assert_eq!(log.hourly_at(NOW), 48);
    }

    #[test]
    fn test_hourly_and_daily_windows() {
        let mut log = UsageLog::default();
        log.push(record(1, EndpointTier::Light, NOW - 2 * DAY_MS));
        log.push(record(1, EndpointTier::Light, NOW - 3 * HOUR_MS));
        log.push(record(1, EndpointTier::Light, NOW - 10 * 60_000));

        assert_eq!(log.hourly_at(NOW), 6);
        assert_eq!(log.daily_at(NOW), 12);
    }

    #[test]
    fn test_ring_is_bounded() {
        let mut log = UsageLog::default();
        for i in 0..150 {
            log.push(record(i, EndpointTier::Light, NOW + i as i64));
        }
        assert_eq!(log.len(), USAGE_HISTORY_CAPACITY);
        let history = log.history();
        assert_eq!(history[0].items_returned, 50);
        assert_eq!(history[99].items_returned, 149);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut log = UsageLog::with_capacity(0);
        log.push(record(1, EndpointTier::Light, NOW));
        assert!(log.is_empty());
    }

    #[test]
    fn test_monthly_from_last_hour() {
        let mut log = UsageLog::default();
        log.push(record(10, EndpointTier::Light, NOW - 1000));
        let settings = FlightServiceSettings::default();
        assert_eq!(
            log.estimate_monthly_at(NOW, &settings, &CreditCosts::default()),
            60 * 24 * 30
        );
    }

    #[test]
    fn test_monthly_from_settings_without_history() {
        let log = UsageLog::default();
        let settings = FlightServiceSettings {
            refresh_interval_minutes: 5,
            max_flights_per_request: 10,
            use_full_endpoint: false,
            ..FlightServiceSettings::default()
        };
        // 12 polls/hour * 10 flights * 6 credits * 720 hours.
        assert_eq!(
            log.estimate_monthly_at(NOW, &settings, &CreditCosts::default()),
            12 * 10 * 6 * 720
        );
    }

    #[test]
    fn test_monthly_projection_uneven_intervals() {
        let log = UsageLog::default();
        let every = |minutes| FlightServiceSettings {
            refresh_interval_minutes: minutes,
            max_flights_per_request: 10,
            use_full_endpoint: false,
            ..FlightServiceSettings::default()
        };
        let costs = CreditCosts::default();

        // 360 polls a month at 60 credits each.
        assert_eq!(log.estimate_monthly_at(NOW, &every(120), &costs), 21_600);
        // 43_200 / 7 polls, floored after multiplying.
        assert_eq!(log.estimate_monthly_at(NOW, &every(7), &costs), 370_285);
    }

    #[test]
    fn test_monthly_ignores_old_history() {
        let mut log = UsageLog::default();
        log.push(record(10, EndpointTier::Light, NOW - 2 * HOUR_MS));
        let settings = FlightServiceSettings {
            refresh_interval_minutes: 60,
            max_flights_per_request: 1,
            use_full_endpoint: true,
            ..FlightServiceSettings::default()
        };
        assert_eq!(
            log.estimate_monthly_at(NOW, &settings, &CreditCosts::default()),
            8 * 720
        );
    }
}
