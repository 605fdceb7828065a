//! Configuration for the motion engine and the overlay helpers around it
//!
//! Every threshold has a default matching field-tested overlay behavior, so
//! `OverlayConfig::default()` is a working setup. Files are TOML with every
//! key optional; missing keys fall back to the defaults.

use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::display::SpeedUnit;

/// Thresholds for fix gating, speed estimation, smoothing and stationary detection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Fixes with worse horizontal accuracy are skipped (meters)
    pub accuracy_threshold_m: f64,
    /// Minimum spacing between accepted fixes (ms); closer fixes hold speed
    pub min_interval_ms: u64,
    /// Below this displacement a fix is treated as GPS drift (meters)
    pub min_distance_m: f64,
    /// Sensor or derived speeds above this are glitches (m/s)
    pub max_reasonable_speed_mps: f64,
    /// Speeds below this are noise for smoothing, bearing and hysteresis (m/s)
    pub movement_threshold_mps: f64,
    /// Speed history length used for the weighted average
    pub history_size: usize,
    /// Samples required before smoothing kicks in
    pub min_smoothing_samples: usize,
    /// Smoothed speed below this counts as stationary (km/h)
    pub stationary_threshold_kmh: f64,
    /// Dwell time before stationary info may refresh (ms)
    pub stationary_refresh_delay_ms: u64,
    /// Minimum age of the last stationary info refresh (ms)
    pub stationary_refresh_interval_ms: u64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            accuracy_threshold_m: 50.0,
            min_interval_ms: 1000,
            min_distance_m: 5.0,
            max_reasonable_speed_mps: 60.0, // 216 km/h
            movement_threshold_mps: 0.5,
            history_size: 5,
            min_smoothing_samples: 3,
            stationary_threshold_kmh: 1.0,
            stationary_refresh_delay_ms: 3_000,
            stationary_refresh_interval_ms: 600_000, // 10 minutes
        }
    }
}

impl MotionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.accuracy_threshold_m > 0.0) {
            return Err(ConfigError::Validation(
                "accuracy_threshold_m must be positive".to_string(),
            ));
        }
        if self.min_distance_m < 0.0 {
            return Err(ConfigError::Validation(
                "min_distance_m must not be negative".to_string(),
            ));
        }
        if !(self.max_reasonable_speed_mps > self.movement_threshold_mps) {
            return Err(ConfigError::Validation(
                "max_reasonable_speed_mps must exceed movement_threshold_mps".to_string(),
            ));
        }
        if self.movement_threshold_mps < 0.0 || self.stationary_threshold_kmh < 0.0 {
            return Err(ConfigError::Validation(
                "speed thresholds must not be negative".to_string(),
            ));
        }
        if self.history_size == 0 {
            return Err(ConfigError::Validation(
                "history_size must be at least 1".to_string(),
            ));
        }
        if self.min_smoothing_samples == 0 || self.min_smoothing_samples > self.history_size {
            return Err(ConfigError::Validation(format!(
                "min_smoothing_samples must be within 1..={}",
                self.history_size
            )));
        }
        Ok(())
    }
}

/// Reverse-geocoding lookup throttling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Refresh the place name at least this often (ms)
    pub update_interval_ms: u64,
    /// Refresh early after moving this far from the last lookup (meters)
    pub update_distance_m: f64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: 60_000,
            update_distance_m: 1_000.0,
        }
    }
}

/// Map path trail settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailConfig {
    pub capacity: usize,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self { capacity: 100 }
    }
}

/// Speed readout settings
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub unit: SpeedUnit,
}

/// Master overlay configuration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Low-power sampling while stationary
    pub power_save: bool,
    /// Skip place-name lookups entirely
    pub data_saver: bool,
    pub motion: MotionConfig,
    pub display: DisplayConfig,
    pub location: LocationConfig,
    pub trail: TrailConfig,
}

impl OverlayConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded overlay config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: OverlayConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML (e.g. to write out a starter config)
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.motion.validate()?;
        if self.trail.capacity == 0 {
            return Err(ConfigError::Validation(
                "trail.capacity must be at least 1".to_string(),
            ));
        }
        if self.location.update_distance_m <= 0.0 {
            return Err(ConfigError::Validation(
                "location.update_distance_m must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply overlay switches from a URL query string
    ///
    /// Recognized keys: `powersave`, `datasaver` (`true`/`false`, any case) and
    /// `unit` (`mph`, anything else selects km/h). A leading `?` is allowed and
    /// unknown keys are ignored.
    ///
    /// # Example
    /// ```
    /// use motion_core::config::OverlayConfig;
    /// use motion_core::display::SpeedUnit;
    ///
    /// let mut config = OverlayConfig::default();
    /// config.apply_query("?unit=mph&powersave=TRUE");
    /// assert_eq!(config.display.unit, SpeedUnit::Mph);
    /// assert!(config.power_save);
    /// ```
    pub fn apply_query(&mut self, query: &str) {
        let query = query.strip_prefix('?').unwrap_or(query);

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key {
                "powersave" => self.power_save = value.eq_ignore_ascii_case("true"),
                "datasaver" => self.data_saver = value.eq_ignore_ascii_case("true"),
                "unit" => {
                    self.display.unit = if value.eq_ignore_ascii_case("mph") {
                        SpeedUnit::Mph
                    } else {
                        if !value.eq_ignore_ascii_case("kmh") {
                            warn!("Unknown speed unit '{}', using km/h", value);
                        }
                        SpeedUnit::Kmh
                    };
                }
                _ => {}
            }
        }
    }

    /// Location refresh interval after data-saver adjustment (ms)
    pub fn effective_location_interval_ms(&self) -> u64 {
        if self.data_saver {
            self.location.update_interval_ms * 2
        } else {
            self.location.update_interval_ms
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}
