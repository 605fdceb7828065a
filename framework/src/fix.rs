//! Position fix types shared across the pipeline

use serde::{Deserialize, Serialize};

use crate::geo;

/// One raw sample from the host's location sensor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    /// Latitude in degrees (positive = North)
    pub latitude: f64,
    /// Longitude in degrees (positive = East)
    pub longitude: f64,
    /// Device-reported ground speed (m/s), if the sensor provides one
    #[serde(default)]
    pub sensor_speed: Option<f64>,
    /// Horizontal accuracy radius (meters)
    pub accuracy: f64,
    /// Fix time (ms, monotonic within a session)
    pub timestamp_ms: u64,
}

impl Fix {
    pub fn new(latitude: f64, longitude: f64, accuracy: f64, timestamp_ms: u64) -> Self {
        Self {
            latitude,
            longitude,
            sensor_speed: None,
            accuracy,
            timestamp_ms,
        }
    }

    /// Builder-style setter for the device-reported speed
    pub fn with_sensor_speed(mut self, speed_mps: f64) -> Self {
        self.sensor_speed = Some(speed_mps);
        self
    }

    pub fn position(&self) -> Position {
        Position {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// A bare latitude/longitude pair (degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to another position (meters)
    pub fn distance_to(&self, other: &Position) -> f64 {
        geo::distance_meters(self.latitude, self.longitude, other.latitude, other.longitude)
    }

    /// Initial bearing toward another position (degrees, `[0, 360)`)
    pub fn bearing_to(&self, other: &Position) -> f64 {
        geo::initial_bearing_deg(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

/// The most recent fix that passed accuracy and interval gating
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptedFix {
    pub position: Position,
    pub timestamp_ms: u64,
}

impl From<&Fix> for AcceptedFix {
    fn from(fix: &Fix) -> Self {
        Self {
            position: fix.position(),
            timestamp_ms: fix.timestamp_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_json_without_sensor_speed() {
        let fix: Fix = serde_json::from_str(
            r#"{"latitude": 40.0, "longitude": -74.0, "accuracy": 8.5, "timestamp_ms": 1200}"#,
        )
        .unwrap();
        assert_eq!(fix.sensor_speed, None);
        assert_eq!(fix.timestamp_ms, 1200);
    }

    #[test]
    fn test_position_helpers() {
        let a = Position::new(40.0, -74.0);
        let b = Position::new(40.001, -74.0);
        assert!((a.distance_to(&b) - 111.19).abs() < 0.05);
        assert!(a.bearing_to(&b).abs() < 1e-6);
    }

    #[test]
    fn test_accepted_from_fix() {
        let fix = Fix::new(1.0, 2.0, 5.0, 99).with_sensor_speed(3.0);
        let accepted = AcceptedFix::from(&fix);
        assert_eq!(accepted.position, Position::new(1.0, 2.0));
        assert_eq!(accepted.timestamp_ms, 99);
    }
}
