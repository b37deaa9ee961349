//! Live running distance for progress feedback while recording.
//!
//! The total is informational. The reported perimeter is always recomputed
//! over the closed polygon at stop time.

use crate::geo_utils::haversine_distance;
use crate::GpsPoint;

#[derive(Debug, Clone, Default)]
pub struct DistanceAccumulator {
    last: Option<GpsPoint>,
    total_meters: f64,
    segments: u32,
}

impl DistanceAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next accepted point; returns the distance added.
    pub fn push(&mut self, point: GpsPoint) -> f64 {
        let added = match self.last {
            Some(prev) => haversine_distance(&prev, &point),
            None => 0.0,
        };
        if self.last.is_some() {
            self.segments += 1;
        }
        self.total_meters += added;
        self.last = Some(point);
        added
    }

    pub fn total_meters(&self) -> f64 {
        self.total_meters
    }

    /// Number of segments summed so far (accepted points minus one).
    pub fn segments(&self) -> u32 {
        self.segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_point_adds_nothing() {
        let mut acc = DistanceAccumulator::new();
        assert_eq!(acc.push(GpsPoint::new(0.0, 0.0)), 0.0);
        assert_eq!(acc.total_meters(), 0.0);
        assert_eq!(acc.segments(), 0);
    }

    #[test]
    fn test_accumulates_segments() {
        let mut acc = DistanceAccumulator::new();
        acc.push(GpsPoint::new(0.0, 0.0));
        let first = acc.push(GpsPoint::new(0.0, 0.0009044));
        acc.push(GpsPoint::new(0.0009044, 0.0009044));
        assert!((first - 100.0).abs() < 1.0);
        assert!((acc.total_meters() - 200.0).abs() < 2.0);
        assert_eq!(acc.segments(), 2);
    }
}
