//! Polygon closing.
//!
//! A boundary walk rarely ends exactly where it started. If the gap between
//! the last and first recorded points exceeds the closure threshold, a copy of
//! the first point is appended to form an explicit closing edge; otherwise the
//! walk is already closed and nothing is duplicated.

use serde::{Deserialize, Serialize};

use crate::error::{OptionExt, Result};
use crate::geo_utils::haversine_distance;
use crate::GpsPoint;

/// Minimum number of points a polygon can be closed from.
pub const MIN_POLYGON_POINTS: usize = 3;

/// Ordered vertex sequence whose first and last entries coincide, either
/// exactly or within the closure tolerance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedPolygon {
    points: Vec<GpsPoint>,
    /// Whether a copy of the first point was appended
    pub closing_point_added: bool,
    /// First-to-last distance of the input walk in meters
    pub closure_gap_meters: f64,
}

impl ClosedPolygon {
    pub fn points(&self) -> &[GpsPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Vertices without the appended closing duplicate.
    pub fn vertices(&self) -> &[GpsPoint] {
        if self.closing_point_added {
            &self.points[..self.points.len() - 1]
        } else {
            &self.points
        }
    }

    pub fn into_points(self) -> Vec<GpsPoint> {
        self.points
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonCloser {
    closure_threshold_meters: f64,
}

impl Default for PolygonCloser {
    fn default() -> Self {
        Self::new(5.0)
    }
}

impl PolygonCloser {
    pub fn new(closure_threshold_meters: f64) -> Self {
        Self {
            closure_threshold_meters,
        }
    }

    pub fn closure_threshold_meters(&self) -> f64 {
        self.closure_threshold_meters
    }

    /// Close an ordered walk of at least three points.
    pub fn close(&self, points: &[GpsPoint]) -> Result<ClosedPolygon> {
        let (first, last) = match points {
            [first, .., last] if points.len() >= MIN_POLYGON_POINTS => Some((*first, *last)),
            _ => None,
        }
        .ok_or_insufficient_points(points.len(), MIN_POLYGON_POINTS)?;
        let gap = haversine_distance(&first, &last);

        let mut closed = Vec::with_capacity(points.len() + 1);
        closed.extend_from_slice(points);
        let closing_point_added = gap > self.closure_threshold_meters;
        if closing_point_added {
            closed.push(first);
        }

        Ok(ClosedPolygon {
            points: closed,
            closing_point_added,
            closure_gap_meters: gap,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SurveyError;

    fn open_square() -> Vec<GpsPoint> {
        vec![
            GpsPoint::new(0.0, 0.0),
            GpsPoint::new(0.0, 0.0009044),
            GpsPoint::new(0.0009044, 0.0009044),
            GpsPoint::new(0.0009044, 0.0),
        ]
    }

    #[test]
    fn test_rejects_short_walk() {
        let points = vec![GpsPoint::new(0.0, 0.0), GpsPoint::new(0.0, 0.001)];
        let err = PolygonCloser::default().close(&points).unwrap_err();
        assert_eq!(
            err,
            SurveyError::InsufficientPoints {
                point_count: 2,
                minimum_required: 3
            }
        );
        assert!(matches!(
            PolygonCloser::default().close(&[]),
            Err(SurveyError::InsufficientPoints { point_count: 0, .. })
        ));
    }

    #[test]
    fn test_appends_closing_point() {
        let closed = PolygonCloser::default().close(&open_square()).unwrap();
        assert!(closed.closing_point_added);
        assert_eq!(closed.len(), 5);
        assert_eq!(closed.points().first(), closed.points().last());
        assert_eq!(closed.vertices().len(), 4);
    }

    #[test]
    fn test_no_duplicate_within_tolerance() {
        let mut points = open_square();
        // ~2 m from the start
        points.push(GpsPoint::new(0.000018, 0.0));
        let closed = PolygonCloser::default().close(&points).unwrap();
        assert!(!closed.closing_point_added);
        assert_eq!(closed.len(), 5);
        assert!(closed.closure_gap_meters <= 5.0);
    }

    #[test]
    fn test_exactly_closed_walk() {
        let mut points = open_square();
        points.push(points[0]);
        let closed = PolygonCloser::default().close(&points).unwrap();
        assert!(!closed.closing_point_added);
        assert_eq!(closed.closure_gap_meters, 0.0);
        assert_eq!(closed.points().first(), closed.points().last());
    }
}
