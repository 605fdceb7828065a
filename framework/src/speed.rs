//! Raw speed estimation between accepted fixes
//!
//! Displacement between accepted fixes is the primary signal. Device-reported
//! speed is trusted when the displacement is large enough to be real motion,
//! and only as an override when the displacement is within GPS drift.
//!
//! The estimator owns the last accepted fix. It advances only when a fix
//! passes accuracy gating and arrives more than `min_interval_ms` after the
//! previous accepted one.

use log::{debug, warn};

use crate::config::MotionConfig;
use crate::fix::{AcceptedFix, Fix};

/// Where a measured speed came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedSource {
    /// Device-reported speed within the plausible range
    Sensor,
    /// Distance / elapsed time between accepted fixes
    Derived,
    /// Derived speed was implausible, current smoothed speed reused
    GlitchHold,
    /// Displacement within drift and no credible sensor speed
    Drift,
}

/// Outcome of one estimation step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpeedEstimate {
    /// First fix of the session became the baseline
    Baseline,
    /// Accuracy too poor, nothing changed
    Rejected { accuracy: f64 },
    /// Fix arrived too soon after the last accepted one; current speed reused
    Hold { speed_mps: f64, elapsed_ms: u64 },
    /// Fix accepted and a new raw speed measured
    Measured {
        speed_mps: f64,
        source: SpeedSource,
        distance_m: f64,
        elapsed_ms: u64,
    },
}

impl SpeedEstimate {
    /// Raw speed to feed the smoother, `None` when the fix was rejected
    pub fn raw_speed(&self) -> Option<f64> {
        match *self {
            SpeedEstimate::Baseline => Some(0.0),
            SpeedEstimate::Rejected { .. } => None,
            SpeedEstimate::Hold { speed_mps, .. } => Some(speed_mps),
            SpeedEstimate::Measured { speed_mps, .. } => Some(speed_mps),
        }
    }

    /// Whether the last accepted fix moved to this fix
    pub fn advanced(&self) -> bool {
        matches!(
            self,
            SpeedEstimate::Baseline | SpeedEstimate::Measured { .. }
        )
    }
}

/// Pick the raw speed for one accepted interval
///
/// # Arguments
/// * `distance_m` - Displacement since the last accepted fix (meters)
/// * `elapsed_ms` - Time since the last accepted fix (ms, > 0)
/// * `sensor_speed` - Device-reported speed (m/s), if any
/// * `current_speed` - Current smoothed speed (m/s), the glitch fallback
/// * `config` - Thresholds
///
/// # Example
/// ```
/// use motion_core::config::MotionConfig;
/// use motion_core::speed::{select_speed, SpeedSource};
///
/// let config = MotionConfig::default();
///
/// // 30 m in 2 s with no sensor speed: derived 15 m/s
/// let (speed, source) = select_speed(30.0, 2000, None, 0.0, &config);
/// assert_eq!(source, SpeedSource::Derived);
/// assert!((speed - 15.0).abs() < 1e-9);
///
/// // 2 m of drift, sensor says 0.3 m/s: treated as standing still
/// let (speed, source) = select_speed(2.0, 2000, Some(0.3), 0.0, &config);
/// assert_eq!((speed, source), (0.0, SpeedSource::Drift));
/// ```
pub fn select_speed(
    distance_m: f64,
    elapsed_ms: u64,
    sensor_speed: Option<f64>,
    current_speed: f64,
    config: &MotionConfig,
) -> (f64, SpeedSource) {
    let max = config.max_reasonable_speed_mps;

    if distance_m >= config.min_distance_m {
        if let Some(speed) = sensor_speed.filter(|s| (0.0..=max).contains(s)) {
            return (speed, SpeedSource::Sensor);
        }

        let derived = distance_m / (elapsed_ms as f64 / 1000.0);
        if derived > max {
            warn!(
                "Derived speed {:.1} m/s over {:.0} m exceeds {:.0} m/s, holding {:.2} m/s",
                derived, distance_m, max, current_speed
            );
            return (current_speed, SpeedSource::GlitchHold);
        }
        (derived, SpeedSource::Derived)
    } else {
        // Within drift only a clearly moving sensor reading counts
        match sensor_speed {
            Some(speed) if speed > config.movement_threshold_mps && speed <= max => {
                (speed, SpeedSource::Sensor)
            }
            _ => (0.0, SpeedSource::Drift),
        }
    }
}

/// Stateful estimator holding the last accepted fix
#[derive(Debug, Clone)]
pub struct SpeedEstimator {
    config: MotionConfig,
    last_accepted: Option<AcceptedFix>,
}

impl SpeedEstimator {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            last_accepted: None,
        }
    }

    /// Last accepted fix, if a baseline exists
    pub fn last_accepted(&self) -> Option<AcceptedFix> {
        self.last_accepted
    }

    pub fn has_baseline(&self) -> bool {
        self.last_accepted.is_some()
    }

    /// Estimate raw speed for a new fix
    ///
    /// # Arguments
    /// * `fix` - Incoming fix
    /// * `current_speed` - Current smoothed speed (m/s), reused on hold and glitch
    pub fn estimate(&mut self, fix: &Fix, current_speed: f64) -> SpeedEstimate {
        let last = match self.last_accepted {
            Some(last) => last,
            None => {
                // Bootstrap accepts any accuracy
                self.last_accepted = Some(AcceptedFix::from(fix));
                debug!(
                    "Baseline fix at ({:.6}, {:.6}), accuracy {:.0} m",
                    fix.latitude, fix.longitude, fix.accuracy
                );
                return SpeedEstimate::Baseline;
            }
        };

        if fix.accuracy > self.config.accuracy_threshold_m {
            return SpeedEstimate::Rejected {
                accuracy: fix.accuracy,
            };
        }

        let elapsed_ms = fix.timestamp_ms.saturating_sub(last.timestamp_ms);
        if elapsed_ms <= self.config.min_interval_ms {
            debug!("Fix {} ms after last accepted, holding speed", elapsed_ms);
            return SpeedEstimate::Hold {
                speed_mps: current_speed,
                elapsed_ms,
            };
        }

        let distance_m = last.position.distance_to(&fix.position());
        let (speed_mps, source) = select_speed(
            distance_m,
            elapsed_ms,
            fix.sensor_speed,
            current_speed,
            &self.config,
        );
        debug!(
            "Moved {:.1} m in {} ms: {:.2} m/s ({:?})",
            distance_m, elapsed_ms, speed_mps, source
        );

        self.last_accepted = Some(AcceptedFix::from(fix));

        SpeedEstimate::Measured {
            speed_mps,
            source,
            distance_m,
            elapsed_ms,
        }
    }

    /// Forget the baseline; the next fix bootstraps again
    pub fn reset(&mut self) {
        self.last_accepted = None;
    }
}

impl Default for SpeedEstimator {
    fn default() -> Self {
        Self::new(MotionConfig::default())
    }
}
