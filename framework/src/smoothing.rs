//! Speed smoothing with low-speed hysteresis
//!
//! Raw speeds go into a short FIFO history and come out as a linearly
//! recency-weighted mean: with N samples the newest has weight N and the
//! oldest weight 1. Two extra rules keep the readout calm at rest:
//!
//! - samples below the movement threshold are clamped to 0 before they enter
//!   the history
//! - when most of the last three samples are below the threshold and the
//!   mean is under twice the threshold, the output is forced to 0
//!
//! A sudden full stop takes up to three samples to read exactly 0.

use std::collections::VecDeque;

use crate::config::MotionConfig;

/// Recency-weighted speed smoother
#[derive(Debug, Clone)]
pub struct SpeedSmoother {
    history: VecDeque<f64>,
    capacity: usize,
    min_samples: usize,
    threshold: f64,
}

impl SpeedSmoother {
    /// Create a smoother
    ///
    /// # Arguments
    /// * `capacity` - History length, at least 1 (oldest evicted first)
    /// * `min_samples` - Samples required before averaging
    /// * `threshold` - Movement threshold (m/s)
    pub fn new(capacity: usize, min_samples: usize, threshold: f64) -> Self {
        // Zero would never evict
        let capacity = capacity.max(1);
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
            min_samples,
            threshold,
        }
    }

    pub fn from_config(config: &MotionConfig) -> Self {
        Self::new(
            config.history_size,
            config.min_smoothing_samples,
            config.movement_threshold_mps,
        )
    }

    /// Add one raw sample and return the smoothed speed (m/s)
    pub fn push(&mut self, raw_speed: f64) -> f64 {
        let sample = if raw_speed < self.threshold {
            0.0
        } else {
            raw_speed
        };

        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(sample);

        if self.history.len() < self.min_samples {
            return sample;
        }

        let average = self.weighted_average();

        let recent_low = self
            .history
            .iter()
            .rev()
            .take(3)
            .filter(|&&s| s < self.threshold)
            .count();
        if recent_low >= 2 && average < self.threshold * 2.0 {
            return 0.0;
        }

        average
    }

    /// Weight i+1 for the i-th oldest sample
    fn weighted_average(&self) -> f64 {
        let (sum, weights) = self
            .history
            .iter()
            .enumerate()
            .fold((0.0, 0.0), |(sum, weights), (i, &s)| {
                let w = (i + 1) as f64;
                (sum + s * w, weights + w)
            });

        if weights > 0.0 {
            sum / weights
        } else {
            0.0
        }
    }

    /// Number of samples currently held
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Samples oldest first (already clamped)
    pub fn history(&self) -> impl Iterator<Item = f64> + '_ {
        self.history.iter().copied()
    }

    /// Enough samples to smooth rather than pass through
    pub fn is_primed(&self) -> bool {
        self.history.len() >= self.min_samples
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}

impl Default for SpeedSmoother {
    fn default() -> Self {
        Self::from_config(&MotionConfig::default())
    }
}
