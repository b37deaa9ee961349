//! Perimeter and area over a closed polygon.
//!
//! Perimeter is the sum of haversine distances along the closed ring.
//!
//! Area uses the shoelace formula on planar coordinates. The projection is
//! chosen by extent: if the latitude or longitude range exceeds
//! `projected_extent_degrees` (default 0.01°, ~1.1 km) the vertices are
//! projected to UTM, otherwise a flat equirectangular projection around the
//! mean latitude is used. A UTM failure falls back to flat projection and
//! flags the result as degraded precision.
//!
//! Polygons crossing the antimeridian are not supported: zone selection and
//! area are undefined for them.

use geo::{Area, Coord, LineString, Polygon};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geo_utils::{compute_center, polyline_length};
use crate::polygon::ClosedPolygon;
use crate::projection::{flat_project, UtmProjection, UtmZone};
use crate::{Bounds, GpsPoint, SurveyConfig};

/// Projection strategy used for an area computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum AreaMode {
    Flat,
    Projected,
}

/// Perimeter and area of one closed polygon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaResult {
    pub perimeter_meters: f64,
    pub area_square_meters: f64,
    pub mode_used: AreaMode,
    /// Projected mode was selected but flat projection had to be used
    pub degraded_precision: bool,
}

/// Signed shoelace area of a planar ring. Positive for counter-clockwise.
pub fn shoelace_signed_area(coords: &[Coord<f64>]) -> f64 {
    Polygon::new(LineString::from(coords.to_vec()), vec![]).signed_area()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaEngine {
    projected_extent_degrees: f64,
}

impl Default for AreaEngine {
    fn default() -> Self {
        Self::new(0.01)
    }
}

impl AreaEngine {
    pub fn new(projected_extent_degrees: f64) -> Self {
        Self {
            projected_extent_degrees,
        }
    }

    pub fn from_config(config: &SurveyConfig) -> Self {
        Self::new(config.projected_extent_degrees)
    }

    /// Mode selected for a polygon with the given vertices.
    pub fn select_mode(&self, points: &[GpsPoint]) -> AreaMode {
        match Bounds::from_points(points) {
            Some(bounds)
                if bounds.lat_range() > self.projected_extent_degrees
                    || bounds.lng_range() > self.projected_extent_degrees =>
            {
                AreaMode::Projected
            }
            _ => AreaMode::Flat,
        }
    }

    /// Perimeter and area with the mode chosen by extent.
    pub fn compute(&self, polygon: &ClosedPolygon) -> AreaResult {
        let mode = self.select_mode(polygon.points());
        self.compute_with_mode(polygon, mode)
    }

    /// Perimeter and area with an explicit mode.
    pub fn compute_with_mode(&self, polygon: &ClosedPolygon, mode: AreaMode) -> AreaResult {
        let perimeter_meters = polyline_length(polygon.points());

        let (area_square_meters, mode_used, degraded_precision) = match mode {
            AreaMode::Flat => (flat_area(polygon), AreaMode::Flat, false),
            AreaMode::Projected => match projected_area(polygon) {
                Ok(area) => (area, AreaMode::Projected, false),
                Err(err) => {
                    warn!("[AreaEngine] {}; falling back to flat projection", err);
                    (flat_area(polygon), AreaMode::Flat, true)
                }
            },
        };

        debug!(
            "[AreaEngine] {} points, perimeter {:.2}m, area {:.2}m² ({:?})",
            polygon.len(),
            perimeter_meters,
            area_square_meters,
            mode_used
        );

        AreaResult {
            perimeter_meters,
            area_square_meters,
            mode_used,
            degraded_precision,
        }
    }
}

/// Shoelace area on the flat projection around the mean vertex latitude.
fn flat_area(polygon: &ClosedPolygon) -> f64 {
    let mean_latitude = compute_center(polygon.vertices()).latitude;
    shoelace_signed_area(&flat_project(polygon.points(), mean_latitude)).abs()
}

/// Shoelace area in the UTM zone of the polygon centroid.
fn projected_area(polygon: &ClosedPolygon) -> Result<f64> {
    let centroid = compute_center(polygon.vertices());
    let projection = UtmProjection::new(UtmZone::for_point(&centroid)?)?;
    let coords = projection.project_all(polygon.points())?;
    Ok(shoelace_signed_area(&coords).abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polygon::PolygonCloser;

    fn square(lat0: f64, lng0: f64, side_deg: f64) -> Vec<GpsPoint> {
        vec![
            GpsPoint::new(lat0, lng0),
            GpsPoint::new(lat0, lng0 + side_deg),
            GpsPoint::new(lat0 + side_deg, lng0 + side_deg),
            GpsPoint::new(lat0 + side_deg, lng0),
        ]
    }

    fn close(points: &[GpsPoint]) -> ClosedPolygon {
        PolygonCloser::default().close(points).unwrap()
    }

    #[test]
    fn test_equator_square_flat() {
        let polygon = close(&square(0.0, 0.0, 0.0009044));
        let result = AreaEngine::default().compute(&polygon);
        assert_eq!(result.mode_used, AreaMode::Flat);
        assert!(!result.degraded_precision);
        assert!((result.area_square_meters - 10_000.0).abs() / 10_000.0 < 0.02);
        assert!((result.perimeter_meters - 400.0).abs() / 400.0 < 0.02);
    }

    #[test]
    fn test_large_polygon_uses_projection() {
        // ~2.2 km side near Pune
        let polygon = close(&square(18.5, 73.8, 0.02));
        let result = AreaEngine::default().compute(&polygon);
        assert_eq!(result.mode_used, AreaMode::Projected);
        assert!(!result.degraded_precision);
        let side_ns = 0.02 * 110_580.0;
        let side_ew = 0.02 * 111_320.0 * 18.51_f64.to_radians().cos();
        let expected = side_ns * side_ew;
        assert!((result.area_square_meters - expected).abs() / expected < 0.01);
    }

    #[test]
    fn test_flat_and_projected_agree_on_small_square() {
        let polygon = close(&square(18.5, 73.8, 0.0009));
        let engine = AreaEngine::default();
        let flat = engine.compute_with_mode(&polygon, AreaMode::Flat);
        let projected = engine.compute_with_mode(&polygon, AreaMode::Projected);
        assert_eq!(projected.mode_used, AreaMode::Projected);
        let rel = (flat.area_square_meters - projected.area_square_meters).abs()
            / projected.area_square_meters;
        assert!(rel < 0.01, "relative difference {}", rel);
        assert_eq!(flat.perimeter_meters, projected.perimeter_meters);
    }

    #[test]
    fn test_projection_failure_falls_back() {
        // Beyond the UTM band
        let polygon = close(&square(85.0, 10.0, 0.02));
        let result = AreaEngine::default().compute(&polygon);
        assert_eq!(result.mode_used, AreaMode::Flat);
        assert!(result.degraded_precision);
        assert!(result.area_square_meters > 0.0);
    }

    #[test]
    fn test_area_invariant_under_rotation_and_reversal() {
        let points = vec![
            GpsPoint::new(18.5000, 73.8000),
            GpsPoint::new(18.5003, 73.8009),
            GpsPoint::new(18.5010, 73.8011),
            GpsPoint::new(18.5012, 73.8002),
            GpsPoint::new(18.5006, 73.7996),
        ];
        let engine = AreaEngine::default();
        let base = engine.compute(&close(&points)).area_square_meters;

        for shift in 1..points.len() {
            let mut rotated = points.clone();
            rotated.rotate_left(shift);
            let area = engine.compute(&close(&rotated)).area_square_meters;
            assert!((area - base).abs() < 1e-6 * base);
        }

        let mut reversed = points.clone();
        reversed.reverse();
        let area = engine.compute(&close(&reversed)).area_square_meters;
        assert!((area - base).abs() < 1e-6 * base);
    }

    #[test]
    fn test_signed_area_flips_with_direction() {
        let ccw = vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 10.0, y: 0.0 },
            Coord { x: 10.0, y: 10.0 },
            Coord { x: 0.0, y: 10.0 },
        ];
        let mut cw = ccw.clone();
        cw.reverse();
        assert_eq!(shoelace_signed_area(&ccw), 100.0);
        assert_eq!(shoelace_signed_area(&cw), -100.0);
    }
}
