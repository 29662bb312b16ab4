//! Periodic polling.
//!
//! [`Poller`] drives a [`FlightService`]: poll, publish the flights on a
//! channel, then sleep until the refresh interval passes, a refresh is
//! requested, or the token is cancelled. The interval is re-read from the
//! settings after every poll, so changes take effect on the next tick.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::flight::Flight;
use crate::geo::Coordinate;
use crate::service::FlightService;

/// Runs polls on a schedule until cancelled.
#[derive(Debug, Clone)]
pub struct Poller {
    service: Arc<FlightService>,
    center: Option<Coordinate>,
}

impl Poller {
    /// Create a poller for `service`.
    #[must_use]
    pub fn new(service: Arc<FlightService>) -> Self {
        Self {
            service,
            center: None,
        }
    }

    /// Always poll around `center` instead of the resolved location.
    #[must_use]
    pub fn with_center(mut self, center: Coordinate) -> Self {
        self.center = Some(center);
        self
    }

    async fn poll(&self) -> Vec<Flight> {
        match &self.center {
            Some(center) => self.service.fetch_flights(center).await,
            None => self.service.refresh().await,
        }
    }

    /// Poll until `cancel` fires or the receiver goes away.
    ///
    /// Polls run one at a time; a slow poll pushes the next tick back.
    pub async fn run(&self, cancel: CancellationToken, tx: mpsc::Sender<Vec<Flight>>) {
        info!("poller started");
        loop {
            let flights = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                flights = self.poll() => flights,
            };

            if tx.send(flights).await.is_err() {
                debug!("flight receiver dropped");
                break;
            }

            let interval = self.service.settings().refresh_interval();
            debug!(?interval, "waiting for next poll");
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(interval) => {}
                () = self.service.refresh_requested() => debug!("refresh requested"),
            }
        }
        info!("poller stopped");
    }
}
