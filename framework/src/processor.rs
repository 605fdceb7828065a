//! Per-fix orchestration
//!
//! `FixProcessor` owns one tracking session: the speed estimator (and with it
//! the last accepted fix), the smoother, and the motion state machine. Each
//! call to [`FixProcessor::ingest`] runs:
//!
//! ```text
//! Fix ─▶ accuracy gate ─▶ SpeedEstimator ─▶ SpeedSmoother ─▶ MotionStateMachine
//!                                                     │
//!                                   bearing (moving only) ─▶ MotionSnapshot
//! ```
//!
//! Nothing here fails. Poor fixes replay the previous snapshot, implausible
//! speeds are substituted, and missing history just means less smoothing.

use log::info;
use serde::Serialize;

use crate::config::MotionConfig;
use crate::fix::{Fix, Position};
use crate::geo::{self, Cardinal};
use crate::motion::{MotionState, MotionStateMachine};
use crate::smoothing::SpeedSmoother;
use crate::speed::{SpeedEstimate, SpeedEstimator, SpeedSource};

/// Display-ready motion state for one fix
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MotionSnapshot {
    /// Timestamp of the fix that produced this snapshot (ms)
    pub timestamp_ms: u64,
    pub smoothed_speed_mps: f64,
    /// Heading in degrees, only while moving above the movement threshold
    pub bearing_deg: Option<f64>,
    pub cardinal: Option<Cardinal>,
    pub motion_state: MotionState,
    pub stationary_duration_ms: Option<u64>,
    /// Host may refresh stationary-only info (weather etc.) now
    pub should_refresh_stationary_info: bool,
}

impl MotionSnapshot {
    /// Snapshot before any motion is known
    fn at_rest(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            smoothed_speed_mps: 0.0,
            bearing_deg: None,
            cardinal: None,
            motion_state: MotionState::default(),
            stationary_duration_ms: None,
            should_refresh_stationary_info: false,
        }
    }

    pub fn speed_kmh(&self) -> f64 {
        self.smoothed_speed_mps * crate::display::MPS_TO_KMH
    }

    pub fn is_stationary(&self) -> bool {
        self.motion_state.is_stationary()
    }
}

/// Session counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessorStats {
    /// Fixes passed to `ingest`
    pub received: u32,
    /// Fixes that moved the last accepted position (including baselines)
    pub accepted: u32,
    /// Fixes skipped for poor accuracy
    pub rejected: u32,
    /// Fixes too close in time to the last accepted one
    pub held: u32,
    /// Implausible derived speeds replaced by the current speed
    pub glitches: u32,
}

/// GPS fix processor for one tracking session
#[derive(Debug, Clone)]
pub struct FixProcessor {
    config: MotionConfig,
    estimator: SpeedEstimator,
    smoother: SpeedSmoother,
    machine: MotionStateMachine,
    current_speed: f64,
    last_bearing: Option<f64>,
    last_snapshot: Option<MotionSnapshot>,
    stats: ProcessorStats,
}

impl FixProcessor {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            estimator: SpeedEstimator::new(config),
            smoother: SpeedSmoother::from_config(&config),
            machine: MotionStateMachine::new(&config),
            current_speed: 0.0,
            last_bearing: None,
            last_snapshot: None,
            stats: ProcessorStats::default(),
        }
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    /// Process one fix and return the resulting snapshot
    pub fn ingest(&mut self, fix: Fix) -> MotionSnapshot {
        self.stats.received += 1;

        let origin = self.estimator.last_accepted().map(|a| a.position);
        let estimate = self.estimator.estimate(&fix, self.current_speed);

        let raw_speed = match estimate.raw_speed() {
            Some(speed) => speed,
            None => {
                self.stats.rejected += 1;
                info!(
                    "Poor accuracy ({:.0} m > {:.0} m), skipping fix at t={}",
                    fix.accuracy, self.config.accuracy_threshold_m, fix.timestamp_ms
                );
                return self
                    .last_snapshot
                    .unwrap_or_else(|| MotionSnapshot::at_rest(fix.timestamp_ms));
            }
        };

        match estimate {
            SpeedEstimate::Hold { .. } => self.stats.held += 1,
            SpeedEstimate::Measured {
                source: SpeedSource::GlitchHold,
                ..
            } => {
                self.stats.glitches += 1;
                self.stats.accepted += 1;
            }
            _ => self.stats.accepted += 1,
        }

        if estimate == SpeedEstimate::Baseline {
            self.last_bearing = None;
        }

        self.current_speed = self.smoother.push(raw_speed);
        let motion_state = self.machine.update(self.current_speed, fix.timestamp_ms);

        let bearing_deg = if self.current_speed > self.config.movement_threshold_mps {
            origin.map(|from| self.bearing_from(from, fix.position()))
        } else {
            None
        };

        let snapshot = MotionSnapshot {
            timestamp_ms: fix.timestamp_ms,
            smoothed_speed_mps: self.current_speed,
            bearing_deg,
            cardinal: bearing_deg.map(geo::cardinal),
            motion_state,
            stationary_duration_ms: self.machine.stationary_duration_ms(fix.timestamp_ms),
            should_refresh_stationary_info: self.machine.poll_refresh(fix.timestamp_ms),
        };

        // A replayed snapshot must not re-trigger the refresh
        self.last_snapshot = Some(MotionSnapshot {
            should_refresh_stationary_info: false,
            ..snapshot
        });

        snapshot
    }

    /// Bearing from the last accepted position, keeping the previous heading
    /// when the fix sits exactly on it
    fn bearing_from(&mut self, from: Position, to: Position) -> f64 {
        let bearing = if from == to {
            self.last_bearing
                .unwrap_or_else(|| from.bearing_to(&to))
        } else {
            from.bearing_to(&to)
        };
        self.last_bearing = Some(bearing);
        bearing
    }

    /// Start over: the next fix becomes a new baseline
    ///
    /// Use after a large context change such as the host app returning from
    /// the background. The last acknowledged stationary-info refresh is kept,
    /// since the host's cached info does not get older by resetting motion.
    /// A fired but unanswered refresh is dropped.
    pub fn reset(&mut self) {
        info!("Resetting motion state");
        self.estimator.reset();
        self.smoother.reset();
        self.machine.reset();
        self.current_speed = 0.0;
        self.last_bearing = None;
        self.last_snapshot = None;
    }

    /// Host completed a stationary-info refresh at `timestamp_ms`
    pub fn acknowledge_refresh(&mut self, timestamp_ms: u64) {
        self.machine.acknowledge_refresh(timestamp_ms);
    }

    /// Host's stationary-info refresh failed; allow it to fire again
    pub fn abandon_refresh(&mut self) {
        self.machine.abandon_refresh();
    }

    /// Current smoothed speed (m/s)
    pub fn current_speed(&self) -> f64 {
        self.current_speed
    }

    pub fn motion_state(&self) -> MotionState {
        self.machine.state()
    }

    pub fn last_snapshot(&self) -> Option<&MotionSnapshot> {
        self.last_snapshot.as_ref()
    }

    pub fn last_accepted_position(&self) -> Option<Position> {
        self.estimator.last_accepted().map(|a| a.position)
    }

    /// Number of samples in the speed history
    pub fn speed_history_len(&self) -> usize {
        self.smoother.len()
    }

    pub fn stats(&self) -> ProcessorStats {
        self.stats
    }
}

impl Default for FixProcessor {
    fn default() -> Self {
        Self::new(MotionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_fix_bootstrap() {
        let mut processor = FixProcessor::default();
        let snapshot = processor.ingest(Fix::new(40.0, -74.0, 10.0, 0));

        assert_eq!(snapshot.smoothed_speed_mps, 0.0);
        assert_eq!(snapshot.bearing_deg, None);
        assert_eq!(snapshot.cardinal, None);
        assert_eq!(
            processor.last_accepted_position(),
            Some(Position::new(40.0, -74.0))
        );
    }

    #[test]
    fn test_first_fix_ignores_accuracy() {
        let mut processor = FixProcessor::default();
        processor.ingest(Fix::new(40.0, -74.0, 900.0, 0));

        assert_eq!(processor.stats().accepted, 1);
        assert_eq!(processor.stats().rejected, 0);
        assert!(processor.last_accepted_position().is_some());
    }

    #[test]
    fn test_northbound_fix_reports_north() {
        let mut processor = FixProcessor::default();
        processor.ingest(Fix::new(40.0, -74.0, 10.0, 0));
        let snapshot = processor.ingest(Fix::new(40.001, -74.0, 10.0, 2000));

        assert!(
            (snapshot.smoothed_speed_mps - 55.6).abs() < 0.1,
            "derived speed below the 60 m/s cap is used as-is: {}",
            snapshot.smoothed_speed_mps
        );
        let bearing = snapshot.bearing_deg.expect("moving fix has a bearing");
        assert!(bearing.abs() < 1e-6, "bearing {}", bearing);
        assert_eq!(snapshot.cardinal, Some(Cardinal::N));
        assert_eq!(snapshot.motion_state, MotionState::Moving);
    }

    #[test]
    fn test_poor_accuracy_replays_previous_snapshot() {
        let mut processor = FixProcessor::default();
        processor.ingest(Fix::new(40.0, -74.0, 10.0, 0));
        let before = processor.ingest(Fix::new(40.0002, -74.0, 10.0, 2000));
        let accepted_before = processor.last_accepted_position();

        let after = processor.ingest(Fix::new(40.01, -74.0, 80.0, 4000));

        assert_eq!(after, before);
        assert_eq!(processor.last_accepted_position(), accepted_before);
        assert_eq!(processor.stats().rejected, 1);
    }

    #[test]
    fn test_snapshot_state_invariant() {
        let mut processor = FixProcessor::default();
        let mut t = 0;
        for step in 0..30 {
            let lat = 40.0 + if step < 15 { step as f64 * 0.0002 } else { 0.003 };
            let snapshot = processor.ingest(Fix::new(lat, -74.0, 10.0, t));
            assert_eq!(
                snapshot.stationary_duration_ms.is_some(),
                snapshot.motion_state.is_stationary(),
                "dwell reported iff stationary (step {})",
                step
            );
            assert_eq!(
                snapshot.bearing_deg.is_some(),
                snapshot.smoothed_speed_mps > 0.5,
                "bearing reported iff moving (step {})",
                step
            );
            t += 2000;
        }
    }

    #[test]
    fn test_hold_reuses_current_speed_and_keeps_origin() {
        let mut processor = FixProcessor::default();
        processor.ingest(Fix::new(40.0, -74.0, 10.0, 0));
        let moving = processor.ingest(Fix::new(40.0002, -74.0, 10.0, 2000));

        // 500 ms later, further east: too soon to measure
        let held = processor.ingest(Fix::new(40.0002, -73.9998, 10.0, 2500));

        assert_eq!(processor.stats().held, 1);
        // History is now [0, v, v]: (0*1 + v*2 + v*3) / 6
        let expected = moving.smoothed_speed_mps * 5.0 / 6.0;
        assert!(
            (held.smoothed_speed_mps - expected).abs() < 1e-9,
            "held speed goes through the smoother: {} vs {}",
            held.smoothed_speed_mps,
            expected
        );
        assert_eq!(
            processor.last_accepted_position(),
            Some(Position::new(40.0002, -74.0))
        );
        assert_eq!(held.cardinal, Some(Cardinal::E), "bearing from last accepted fix");
    }

    #[test]
    fn test_history_bounded() {
        let mut processor = FixProcessor::default();
        for i in 0..12u64 {
            processor.ingest(Fix::new(40.0 + i as f64 * 0.0001, -74.0, 10.0, i * 2000));
        }
        assert_eq!(processor.speed_history_len(), 5);
    }

    #[test]
    fn test_refresh_once_then_acknowledged() {
        let mut processor = FixProcessor::default();
        processor.ingest(Fix::new(40.0, -74.0, 10.0, 0));

        let mut fired = Vec::new();
        for t in (1500..=10_000).step_by(1500) {
            let snapshot = processor.ingest(Fix::new(40.0, -74.0, 10.0, t));
            if snapshot.should_refresh_stationary_info {
                fired.push(t);
            }
        }
        assert_eq!(fired, vec![4500], "fires once after 3 s of dwell");

        processor.acknowledge_refresh(4500);
        let snapshot = processor.ingest(Fix::new(40.0, -74.0, 10.0, 12_000));
        assert!(!snapshot.should_refresh_stationary_info);
    }

    #[test]
    fn test_rejected_fix_does_not_replay_refresh() {
        let mut processor = FixProcessor::default();
        processor.ingest(Fix::new(40.0, -74.0, 10.0, 0));
        let fired = processor.ingest(Fix::new(40.0, -74.0, 10.0, 3500));
        assert!(fired.should_refresh_stationary_info);

        let replay = processor.ingest(Fix::new(40.0, -74.0, 99.0, 4000));
        assert!(!replay.should_refresh_stationary_info);
    }

    #[test]
    fn test_reset_rebootstraps() {
        let mut processor = FixProcessor::default();
        processor.ingest(Fix::new(40.0, -74.0, 10.0, 0));
        processor.ingest(Fix::new(40.0003, -74.0, 10.0, 2000));
        processor.ingest(Fix::new(40.0006, -74.0, 10.0, 4000));

        processor.reset();
        assert_eq!(processor.speed_history_len(), 0);
        assert_eq!(processor.last_accepted_position(), None);
        assert_eq!(processor.motion_state(), MotionState::Moving);

        // Far away and inaccurate, but it is a first fix again
        let snapshot = processor.ingest(Fix::new(48.85, 2.35, 120.0, 600_000));
        assert_eq!(snapshot.smoothed_speed_mps, 0.0);
        assert_eq!(snapshot.bearing_deg, None);
        assert_eq!(
            processor.last_accepted_position(),
            Some(Position::new(48.85, 2.35))
        );
    }

    #[test]
    fn test_zero_history_size_stays_bounded() {
        let config = MotionConfig {
            history_size: 0,
            min_smoothing_samples: 0,
            ..MotionConfig::default()
        };
        let mut processor = FixProcessor::new(config);
        for i in 0..50u64 {
            processor.ingest(Fix::new(40.0 + i as f64 * 0.0001, -74.0, 10.0, i * 2000));
        }
        assert_eq!(processor.speed_history_len(), 1);
    }
}
