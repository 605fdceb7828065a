//! Moving / stationary state machine
//!
//! Driven by smoothed speed only. Raw sensor speed never reaches this
//! module, which keeps the state from flapping on single noisy fixes.
//!
//! While stationary the machine also decides when the host may refresh
//! stationary-only information (weather, local time). A refresh fires once
//! the dwell time passes `stationary_refresh_delay_ms` and the last
//! acknowledged refresh is older than `stationary_refresh_interval_ms`. After
//! firing it stays quiet until the host acknowledges or abandons it.

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::MotionConfig;
use crate::display::MPS_TO_KMH;

/// Motion classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum MotionState {
    /// Also the session start state; the first slow sample starts the dwell clock
    #[default]
    Moving,
    /// Stopped since the given fix timestamp (ms)
    Stationary { since_ms: u64 },
}

impl MotionState {
    pub fn is_stationary(&self) -> bool {
        matches!(self, MotionState::Stationary { .. })
    }

    /// Timestamp the current stop began
    pub fn stationary_since(&self) -> Option<u64> {
        match *self {
            MotionState::Stationary { since_ms } => Some(since_ms),
            MotionState::Moving => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MotionState::Moving => "MOVING",
            MotionState::Stationary { .. } => "STATIONARY",
        }
    }
}

/// Stationary detection and refresh gating
#[derive(Debug, Clone)]
pub struct MotionStateMachine {
    state: MotionState,
    threshold_kmh: f64,
    refresh_delay_ms: u64,
    refresh_interval_ms: u64,

    // Host refresh bookkeeping
    last_refresh_ms: Option<u64>,
    refresh_pending: bool,
}

impl MotionStateMachine {
    pub fn new(config: &MotionConfig) -> Self {
        Self {
            state: MotionState::default(),
            threshold_kmh: config.stationary_threshold_kmh,
            refresh_delay_ms: config.stationary_refresh_delay_ms,
            refresh_interval_ms: config.stationary_refresh_interval_ms,
            last_refresh_ms: None,
            refresh_pending: false,
        }
    }

    /// Feed one smoothed speed sample
    ///
    /// # Arguments
    /// * `smoothed_speed` - Smoothed speed (m/s)
    /// * `timestamp_ms` - Fix timestamp (ms)
    ///
    /// # Returns
    /// The state after the update
    pub fn update(&mut self, smoothed_speed: f64, timestamp_ms: u64) -> MotionState {
        let stopped = smoothed_speed * MPS_TO_KMH < self.threshold_kmh;

        match (self.state, stopped) {
            (MotionState::Moving, true) => {
                info!("Stationary at t={} ms", timestamp_ms);
                self.state = MotionState::Stationary {
                    since_ms: timestamp_ms,
                };
            }
            (MotionState::Stationary { since_ms }, false) => {
                info!(
                    "Moving at t={} ms after {} ms stationary",
                    timestamp_ms,
                    timestamp_ms.saturating_sub(since_ms)
                );
                self.state = MotionState::Moving;
                // An unanswered refresh belongs to the stop that just ended
                self.refresh_pending = false;
            }
            _ => {}
        }

        self.state
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    /// Dwell time of the current stop at `now_ms`
    pub fn stationary_duration_ms(&self, now_ms: u64) -> Option<u64> {
        self.state
            .stationary_since()
            .map(|since| now_ms.saturating_sub(since))
    }

    /// Check whether stationary info should refresh now
    ///
    /// Returns `true` at most once per refresh cycle: the refresh is marked
    /// pending until [`acknowledge_refresh`](Self::acknowledge_refresh) or
    /// [`abandon_refresh`](Self::abandon_refresh) is called, or until the
    /// stop ends.
    pub fn poll_refresh(&mut self, now_ms: u64) -> bool {
        if self.refresh_pending {
            return false;
        }

        let dwell_ok = self
            .stationary_duration_ms(now_ms)
            .is_some_and(|dwell| dwell > self.refresh_delay_ms);
        if !dwell_ok {
            return false;
        }

        let stale = match self.last_refresh_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) > self.refresh_interval_ms,
        };

        if stale {
            self.refresh_pending = true;
        }
        stale
    }

    /// Host finished a refresh successfully at `timestamp_ms`
    pub fn acknowledge_refresh(&mut self, timestamp_ms: u64) {
        self.last_refresh_ms = Some(timestamp_ms);
        self.refresh_pending = false;
    }

    /// Host gave up on a fired refresh; it may fire again on the next fix
    pub fn abandon_refresh(&mut self) {
        self.refresh_pending = false;
    }

    pub fn is_refresh_pending(&self) -> bool {
        self.refresh_pending
    }

    pub fn last_refresh_ms(&self) -> Option<u64> {
        self.last_refresh_ms
    }

    /// Back to the initial state; the last acknowledged refresh survives
    pub fn reset(&mut self) {
        self.state = MotionState::default();
        self.refresh_pending = false;
    }
}

impl Default for MotionStateMachine {
    fn default() -> Self {
        Self::new(&MotionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_moving_without_dwell() {
        let machine = MotionStateMachine::default();
        assert_eq!(machine.state(), MotionState::Moving);
        assert_eq!(machine.stationary_duration_ms(5000), None);
    }

    #[test]
    fn test_transition_threshold_in_kmh() {
        let mut machine = MotionStateMachine::default();

        // 0.27 m/s = 0.972 km/h
        assert_eq!(
            machine.update(0.27, 1000),
            MotionState::Stationary { since_ms: 1000 }
        );
        // 0.28 m/s = 1.008 km/h
        assert_eq!(machine.update(0.28, 2000), MotionState::Moving);
        assert_eq!(machine.state().stationary_since(), None);
    }

    #[test]
    fn test_since_set_on_entry_only() {
        let mut machine = MotionStateMachine::default();
        machine.update(0.0, 1000);
        machine.update(0.0, 2000);
        machine.update(0.0, 3000);

        assert_eq!(machine.state().stationary_since(), Some(1000));
        assert_eq!(machine.stationary_duration_ms(3000), Some(2000));
    }

    #[test]
    fn test_dwell_monotonic() {
        let mut machine = MotionStateMachine::default();
        let mut last = 0;
        for t in (0..20_000).step_by(700) {
            machine.update(0.0, t);
            let dwell = machine.stationary_duration_ms(t).unwrap();
            assert!(dwell >= last, "dwell went backwards at t={}", t);
            last = dwell;
        }
    }

    #[test]
    fn test_refresh_fires_once_until_acknowledged() {
        let mut machine = MotionStateMachine::default();
        machine.update(0.0, 0);

        assert!(!machine.poll_refresh(3000), "dwell must exceed 3000 ms");
        machine.update(0.0, 3500);
        assert!(machine.poll_refresh(3500));
        assert!(machine.is_refresh_pending());

        for t in [4500, 5500, 700_000] {
            machine.update(0.0, t);
            assert!(!machine.poll_refresh(t), "pending refresh must not refire");
        }

        machine.acknowledge_refresh(700_000);
        machine.update(0.0, 701_000);
        assert!(!machine.poll_refresh(701_000), "fresh after acknowledgement");

        machine.update(0.0, 1_300_001);
        assert!(machine.poll_refresh(1_300_001), "stale again after the interval");
    }

    #[test]
    fn test_abandoned_refresh_refires() {
        let mut machine = MotionStateMachine::default();
        machine.update(0.0, 0);
        assert!(machine.poll_refresh(4000));

        machine.abandon_refresh();
        assert!(machine.poll_refresh(5000));
        assert_eq!(machine.last_refresh_ms(), None);
    }

    #[test]
    fn test_no_refresh_while_moving() {
        let mut machine = MotionStateMachine::default();
        machine.update(0.0, 0);
        machine.update(5.0, 10_000);
        assert!(!machine.poll_refresh(10_000));
    }

    #[test]
    fn test_new_stop_restarts_dwell() {
        let mut machine = MotionStateMachine::default();
        machine.update(0.0, 0);
        machine.update(5.0, 10_000);
        machine.update(0.0, 12_000);

        assert_eq!(machine.stationary_duration_ms(14_000), Some(2000));
        assert!(!machine.poll_refresh(14_000), "new stop has not dwelled long enough");
        assert!(machine.poll_refresh(15_001));
    }

    #[test]
    fn test_reset_keeps_refresh_bookkeeping() {
        let mut machine = MotionStateMachine::default();
        machine.update(0.0, 0);
        machine.acknowledge_refresh(100);
        machine.reset();

        assert_eq!(machine.state(), MotionState::Moving);
        assert_eq!(machine.last_refresh_ms(), Some(100));
    }

    #[test]
    fn test_state_labels() {
        assert_eq!(MotionState::Moving.as_str(), "MOVING");
        assert_eq!(MotionState::Stationary { since_ms: 1 }.as_str(), "STATIONARY");
    }

    #[test]
    fn test_unanswered_refresh_cleared_by_next_stop() {
        let mut machine = MotionStateMachine::default();
        machine.update(0.0, 0);
        assert!(machine.poll_refresh(4000));

        // Host never answers; the car drives off and stops again
        machine.update(5.0, 10_000);
        assert!(!machine.is_refresh_pending());
        machine.update(0.0, 20_000);
        assert!(machine.poll_refresh(23_500), "new stop may refresh again");
    }

    #[test]
    fn test_reset_clears_pending_refresh() {
        let mut machine = MotionStateMachine::default();
        machine.update(0.0, 0);
        assert!(machine.poll_refresh(4000));

        machine.reset();
        assert!(!machine.is_refresh_pending());
        machine.update(0.0, 5000);
        assert!(machine.poll_refresh(8500));
    }
}
