//! Bounded trail of recent moving positions for map polylines

use std::collections::VecDeque;

use crate::fix::Position;
use crate::processor::MotionSnapshot;

/// Recent positions recorded while moving, oldest first
#[derive(Debug, Clone)]
pub struct PathTrail {
    points: VecDeque<Position>,
    capacity: usize,
    min_speed_mps: f64,
}

impl PathTrail {
    /// # Arguments
    /// * `capacity` - Maximum number of points kept (at least 1)
    /// * `min_speed_mps` - Only record while smoothed speed exceeds this
    pub fn new(capacity: usize, min_speed_mps: f64) -> Self {
        // Zero would never evict
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
            min_speed_mps,
        }
    }

    /// Record `position` if the snapshot shows motion; returns whether it was added
    pub fn record(&mut self, position: Position, snapshot: &MotionSnapshot) -> bool {
        if snapshot.smoothed_speed_mps <= self.min_speed_mps {
            return false;
        }

        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(position);
        true
    }

    pub fn points(&self) -> impl Iterator<Item = &Position> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fix::Fix;
    use crate::processor::FixProcessor;

    #[test]
    fn test_records_only_while_moving() {
        let mut processor = FixProcessor::default();
        let mut trail = PathTrail::new(100, 0.5);

        let fix = Fix::new(40.0, -74.0, 10.0, 0);
        let snapshot = processor.ingest(fix);
        assert!(!trail.record(fix.position(), &snapshot), "bootstrap is at rest");

        let fix = Fix::new(40.0002, -74.0, 10.0, 2000);
        let snapshot = processor.ingest(fix);
        assert!(trail.record(fix.position(), &snapshot));
        assert_eq!(trail.len(), 1);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut processor = FixProcessor::default();
        let mut trail = PathTrail::new(3, 0.5);
        processor.ingest(Fix::new(40.0, -74.0, 10.0, 0));

        for i in 1..=6u64 {
            let fix = Fix::new(40.0 + i as f64 * 0.0002, -74.0, 10.0, i * 2000);
            let snapshot = processor.ingest(fix);
            trail.record(fix.position(), &snapshot);
        }

        let lats: Vec<f64> = trail.points().map(|p| p.latitude).collect();
        assert_eq!(lats.len(), 3);
        assert!((lats[0] - 40.0008).abs() < 1e-9, "oldest kept is fix 4: {:?}", lats);
        assert!((lats[2] - 40.0012).abs() < 1e-9);
    }

    #[test]
    fn test_zero_capacity_keeps_latest_point() {
        let mut processor = FixProcessor::default();
        let mut trail = PathTrail::new(0, 0.5);
        processor.ingest(Fix::new(40.0, -74.0, 10.0, 0));

        for i in 1..=10u64 {
            let fix = Fix::new(40.0 + i as f64 * 0.0002, -74.0, 10.0, i * 2000);
            let snapshot = processor.ingest(fix);
            trail.record(fix.position(), &snapshot);
        }

        assert_eq!(trail.len(), 1);
        let last = trail.points().next().unwrap();
        assert!((last.latitude - 40.002).abs() < 1e-9, "got {:?}", last);
    }
}
