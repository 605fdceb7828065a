//! Speed readout helpers for renderers
//!
//! Converts smoothed speed to the configured unit, suppresses crawl speeds
//! below 1 unit, and classifies the result into color bands.

use serde::{Deserialize, Serialize};

/// m/s → km/h
pub const MPS_TO_KMH: f64 = 3.6;
/// m/s → mph
pub const MPS_TO_MPH: f64 = 2.23694;

/// Unit used for the speed readout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedUnit {
    #[default]
    Kmh,
    Mph,
}

impl SpeedUnit {
    /// Multiplier from m/s
    pub fn factor(&self) -> f64 {
        match self {
            SpeedUnit::Kmh => MPS_TO_KMH,
            SpeedUnit::Mph => MPS_TO_MPH,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SpeedUnit::Kmh => "km/h",
            SpeedUnit::Mph => "mph",
        }
    }

    /// Change in displayed value that triggers the update pulse
    fn jump_threshold(&self) -> f64 {
        match self {
            SpeedUnit::Kmh => 2.0,
            SpeedUnit::Mph => 1.5,
        }
    }

    /// Upper bounds of the slow, medium and fast bands
    fn band_limits(&self) -> [f64; 3] {
        match self {
            SpeedUnit::Kmh => [10.0, 30.0, 60.0],
            SpeedUnit::Mph => [6.0, 18.0, 37.0],
        }
    }
}

/// Color band of the displayed speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpeedBand {
    Stationary,
    Slow,
    Medium,
    Fast,
    VeryFast,
}

impl SpeedBand {
    /// Band for an already-converted display value
    pub fn classify(display_speed: f64, unit: SpeedUnit) -> Self {
        let [slow, medium, fast] = unit.band_limits();
        if display_speed == 0.0 {
            SpeedBand::Stationary
        } else if display_speed < slow {
            SpeedBand::Slow
        } else if display_speed < medium {
            SpeedBand::Medium
        } else if display_speed < fast {
            SpeedBand::Fast
        } else {
            SpeedBand::VeryFast
        }
    }

    /// CSS-style class name
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeedBand::Stationary => "speed-stationary",
            SpeedBand::Slow => "speed-slow",
            SpeedBand::Medium => "speed-medium",
            SpeedBand::Fast => "speed-fast",
            SpeedBand::VeryFast => "speed-very-fast",
        }
    }
}

/// Convert m/s to a display value, zeroing anything below 1 unit
pub fn display_speed(speed_mps: f64, unit: SpeedUnit) -> f64 {
    let speed = (speed_mps * unit.factor()).max(0.0);
    if speed < 1.0 {
        0.0
    } else {
        speed
    }
}

/// One rendered speed value
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpeedReading {
    /// Converted speed (one decimal is enough for display)
    pub value: f64,
    pub unit: &'static str,
    pub band: SpeedBand,
    /// Value jumped sharply since the previous reading
    pub pulse: bool,
}

/// Stateful readout tracking the previously displayed value
#[derive(Debug, Clone)]
pub struct SpeedReadout {
    unit: SpeedUnit,
    last_value: f64,
}

impl SpeedReadout {
    pub fn new(unit: SpeedUnit) -> Self {
        Self {
            unit,
            last_value: 0.0,
        }
    }

    pub fn unit(&self) -> SpeedUnit {
        self.unit
    }

    /// Produce the next reading from a smoothed speed in m/s
    pub fn update(&mut self, speed_mps: f64) -> SpeedReading {
        let value = display_speed(speed_mps, self.unit);
        let pulse = (value - self.last_value).abs() > self.unit.jump_threshold();
        self.last_value = value;

        SpeedReading {
            value,
            unit: self.unit.label(),
            band: SpeedBand::classify(value, self.unit),
            pulse,
        }
    }
}

impl Default for SpeedReadout {
    fn default() -> Self {
        Self::new(SpeedUnit::default())
    }
}
