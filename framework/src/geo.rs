//! Great-circle geodesy for GPS fixes
//!
//! Pure functions over WGS84 latitude/longitude in degrees. Distances use the
//! haversine formula on a spherical Earth, which is well within GPS noise for
//! the fix-to-fix spans this crate deals with.

use serde::{Deserialize, Serialize};

/// Mean Earth radius (meters)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two positions in meters
///
/// # Arguments
/// * `lat1`, `lon1` - First position (degrees)
/// * `lat2`, `lon2` - Second position (degrees)
///
/// # Example
/// ```
/// use motion_core::geo::distance_meters;
///
/// // 0.001° of latitude is roughly 111 m
/// let d = distance_meters(40.0, -74.0, 40.001, -74.0);
/// assert!((d - 111.2).abs() < 0.5);
/// ```
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Initial (forward) bearing from the first position to the second
///
/// Returns degrees clockwise from true north in `[0, 360)`.
/// Coincident positions yield 0.
pub fn initial_bearing_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let y = dlon.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlon.cos();

    let bearing = y.atan2(x).to_degrees().rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative angles
    if bearing >= 360.0 {
        0.0
    } else {
        bearing
    }
}

/// Eight-point compass direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinal {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Cardinal {
    const ALL: [Cardinal; 8] = [
        Cardinal::N,
        Cardinal::NE,
        Cardinal::E,
        Cardinal::SE,
        Cardinal::S,
        Cardinal::SW,
        Cardinal::W,
        Cardinal::NW,
    ];

    /// Abbreviation for display ("N", "NE", ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            Cardinal::N => "N",
            Cardinal::NE => "NE",
            Cardinal::E => "E",
            Cardinal::SE => "SE",
            Cardinal::S => "S",
            Cardinal::SW => "SW",
            Cardinal::W => "W",
            Cardinal::NW => "NW",
        }
    }
}

impl core::fmt::Display for Cardinal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nearest compass point for a bearing in degrees
///
/// Sectors are 45° wide and centered on each point, so 22.5° rounds up to NE
/// and 337.5° wraps to N.
pub fn cardinal(bearing_deg: f64) -> Cardinal {
    let index = (bearing_deg / 45.0).round().rem_euclid(8.0) as usize;
    Cardinal::ALL[index % 8]
}
