//! GPS motion-state engine for live location overlays
//!
//! Turns a stream of raw, noisy position fixes into stable display values:
//! a smoothed speed, a heading (only while actually moving), a
//! moving/stationary classification with dwell time, and a one-shot signal
//! telling the host when to refresh stationary-only information.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐   ┌────────────────┐   ┌───────────────┐   ┌────────────────────┐
//! │ Fix (host)   │──▶│ SpeedEstimator │──▶│ SpeedSmoother │──▶│ MotionStateMachine │
//! └──────────────┘   └────────────────┘   └───────────────┘   └────────────────────┘
//!                                                                      │
//!                                                               MotionSnapshot
//! ```
//!
//! Host-side helpers sit beside the pipeline and consume snapshots:
//! [`display`] for the speed readout, [`profile`] for power-save sampling,
//! [`refresh`] for place-name lookup scheduling and [`trail`] for the map
//! polyline.
//!
//! ## Example Usage
//!
//! ```rust
//! use motion_core::{Fix, FixProcessor, MotionConfig};
//!
//! let mut processor = FixProcessor::new(MotionConfig::default());
//!
//! let first = processor.ingest(Fix::new(40.0, -74.0, 10.0, 0));
//! assert_eq!(first.smoothed_speed_mps, 0.0);
//!
//! // ~111 m north two seconds later
//! let next = processor.ingest(Fix::new(40.001, -74.0, 10.0, 2000));
//! assert_eq!(next.cardinal.map(|c| c.as_str()), Some("N"));
//! ```
//!
//! The library only logs through the `log` facade; installing a logger is up
//! to the host.

pub mod config;
pub mod display;
pub mod fix;
pub mod geo;
pub mod motion;
pub mod processor;
pub mod profile;
pub mod refresh;
pub mod smoothing;
pub mod speed;
pub mod trail;

// Re-export commonly used types
pub use config::{ConfigError, MotionConfig, OverlayConfig};
pub use display::{SpeedBand, SpeedReading, SpeedReadout, SpeedUnit};
pub use fix::{Fix, Position};
pub use geo::Cardinal;
pub use motion::MotionState;
pub use processor::{FixProcessor, MotionSnapshot, ProcessorStats};
pub use profile::{ProfileSwitcher, SamplingOptions, SamplingProfile};
pub use refresh::LocationRefreshGate;
pub use trail::PathTrail;
