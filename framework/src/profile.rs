//! Location sampling profiles for power saving
//!
//! Hosts with power saving enabled drop to a cheap, coarse sampling profile
//! while stationary and return to high accuracy once moving. The switch is
//! driven by the snapshot's motion state only.

use log::info;
use serde::Serialize;

use crate::processor::MotionSnapshot;

/// Options a host passes to its location sensor subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SamplingOptions {
    pub high_accuracy: bool,
    /// Give up on a fix after this long (ms)
    pub timeout_ms: u32,
    /// Accept cached fixes up to this age (ms)
    pub maximum_age_ms: u32,
}

impl SamplingOptions {
    /// Session defaults before any profile switch
    pub fn base(power_save: bool) -> Self {
        if power_save {
            Self {
                high_accuracy: false,
                timeout_ms: 20_000,
                maximum_age_ms: 5_000,
            }
        } else {
            Self {
                high_accuracy: true,
                timeout_ms: 10_000,
                maximum_age_ms: 1_000,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingProfile {
    High,
    Low,
}

impl SamplingProfile {
    /// Apply this profile on top of the power-save base options
    pub fn options(&self) -> SamplingOptions {
        let base = SamplingOptions::base(true);
        match self {
            SamplingProfile::High => SamplingOptions {
                high_accuracy: true,
                maximum_age_ms: 1_000,
                ..base
            },
            SamplingProfile::Low => SamplingOptions {
                high_accuracy: false,
                maximum_age_ms: 10_000,
                ..base
            },
        }
    }

    pub fn for_snapshot(snapshot: &MotionSnapshot) -> Self {
        if snapshot.is_stationary() {
            SamplingProfile::Low
        } else {
            SamplingProfile::High
        }
    }
}

/// Tracks the active profile and reports changes
#[derive(Debug, Clone)]
pub struct ProfileSwitcher {
    power_save: bool,
    current: SamplingProfile,
}

impl ProfileSwitcher {
    pub fn new(power_save: bool) -> Self {
        Self {
            power_save,
            current: SamplingProfile::High,
        }
    }

    pub fn current(&self) -> SamplingProfile {
        self.current
    }

    /// Options to subscribe with at session start
    pub fn initial_options(&self) -> SamplingOptions {
        SamplingOptions::base(self.power_save)
    }

    /// Returns new options when the host should resubscribe
    pub fn observe(&mut self, snapshot: &MotionSnapshot) -> Option<SamplingOptions> {
        if !self.power_save {
            return None;
        }

        let wanted = SamplingProfile::for_snapshot(snapshot);
        if wanted == self.current {
            return None;
        }

        info!("Sampling profile {:?} -> {:?}", self.current, wanted);
        self.current = wanted;
        Some(wanted.options())
    }
}
