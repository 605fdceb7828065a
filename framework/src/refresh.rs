//! Place-name lookup scheduling
//!
//! Reverse geocoding is expensive and rate limited, so the host asks this
//! gate before each lookup. A lookup is due when none has succeeded yet, when
//! the last one is older than the interval, or when the device has moved far
//! from where it was made. The gate never performs the lookup itself.

use log::debug;

use crate::config::OverlayConfig;
use crate::fix::Position;

/// Time/distance gate for place-name lookups
#[derive(Debug, Clone)]
pub struct LocationRefreshGate {
    interval_ms: u64,
    distance_m: f64,
    disabled: bool,
    last_success: Option<(Position, u64)>,
    failures: u32,
}

impl LocationRefreshGate {
    /// # Arguments
    /// * `interval_ms` - Maximum age of a place name (ms)
    /// * `distance_m` - Movement that forces an early lookup (meters)
    pub fn new(interval_ms: u64, distance_m: f64) -> Self {
        Self {
            interval_ms,
            distance_m,
            disabled: false,
            last_success: None,
            failures: 0,
        }
    }

    /// Gate configured from overlay settings; data saver disables lookups
    pub fn from_config(config: &OverlayConfig) -> Self {
        let mut gate = Self::new(
            config.effective_location_interval_ms(),
            config.location.update_distance_m,
        );
        gate.disabled = config.data_saver;
        gate
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Whether a lookup should run for this position
    pub fn should_refresh(&self, position: Position, timestamp_ms: u64) -> bool {
        if self.disabled {
            return false;
        }

        let Some((last_position, last_ms)) = self.last_success else {
            return true;
        };

        if timestamp_ms.saturating_sub(last_ms) > self.interval_ms {
            debug!("Place name older than {} ms", self.interval_ms);
            return true;
        }

        let moved = last_position.distance_to(&position);
        if moved > self.distance_m {
            debug!("Moved {:.0} m since last place lookup", moved);
            return true;
        }

        false
    }

    /// Lookup for `position` succeeded at `timestamp_ms`
    pub fn record_success(&mut self, position: Position, timestamp_ms: u64) {
        self.last_success = Some((position, timestamp_ms));
        self.failures = 0;
    }

    /// Lookup failed; the gate stays open so the next fix retries
    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    /// Consecutive failures since the last success
    pub fn failures(&self) -> u32 {
        self.failures
    }
}
