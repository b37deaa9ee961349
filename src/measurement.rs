//! Completed measurement results.

use serde::{Deserialize, Serialize};

use crate::area::{AreaMode, AreaResult};
use crate::polygon::ClosedPolygon;
use crate::quality::QualityReport;
use crate::units::AreaUnits;

/// Outcome of one completed boundary walk. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct MeasurementResult {
    /// Perimeter of the closed polygon in meters
    pub perimeter_meters: f64,
    pub area_square_meters: f64,
    pub acres: f64,
    pub hectares: f64,
    /// Local area unit
    pub guntha: f64,
    pub cents: f64,
    /// Fixes accepted over the whole session
    pub points_recorded: u32,
    /// Vertices of the closed polygon, including any appended closing point
    pub closed_polygon_point_count: u32,
    pub avg_accuracy_meters: f64,
    pub skipped_point_count: u32,
    pub data_quality_percent: f64,
    pub area_mode: AreaMode,
    /// Area is less reliable than the walk allows: UTM projection failed and
    /// flat projection was used, or the oldest points were trimmed
    pub degraded_precision: bool,
    /// Oldest accepted points dropped by the recording window cap
    pub trimmed_point_count: u32,
    /// Live running distance at stop time (informational)
    pub live_distance_meters: f64,
    /// 1-based position in the results list
    pub measurement_index: u32,
}

impl MeasurementResult {
    pub fn new(
        area: &AreaResult,
        polygon: &ClosedPolygon,
        quality: &QualityReport,
        trimmed_point_count: u32,
        live_distance_meters: f64,
        measurement_index: u32,
    ) -> Self {
        let units = AreaUnits::from_square_meters(area.area_square_meters);
        Self {
            perimeter_meters: area.perimeter_meters,
            area_square_meters: units.square_meters,
            acres: units.acres,
            hectares: units.hectares,
            guntha: units.guntha,
            cents: units.cents,
            points_recorded: quality.accepted_count,
            closed_polygon_point_count: polygon.len() as u32,
            avg_accuracy_meters: quality.avg_accuracy_meters,
            skipped_point_count: quality.skipped_count,
            data_quality_percent: quality.data_quality_percent,
            area_mode: area.mode_used,
            degraded_precision: area.degraded_precision || trimmed_point_count > 0,
            trimmed_point_count,
            live_distance_meters,
            measurement_index,
        }
    }

    pub fn units(&self) -> AreaUnits {
        AreaUnits::from_square_meters(self.area_square_meters)
    }

    /// Copy carrying a different list position.
    pub fn with_index(&self, measurement_index: u32) -> Self {
        Self {
            measurement_index,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::AreaEngine;
    use crate::filter::SkipCounter;
    use crate::polygon::PolygonCloser;
    use crate::quality::QualityReporter;
    use crate::GpsPoint;

    #[test]
    fn test_units_follow_area() {
        let polygon = PolygonCloser::default()
            .close(&[
                GpsPoint::new(0.0, 0.0),
                GpsPoint::new(0.0, 0.0009044),
                GpsPoint::new(0.0009044, 0.0009044),
                GpsPoint::new(0.0009044, 0.0),
            ])
            .unwrap();
        let area = AreaEngine::default().compute(&polygon);
        let mut reporter = QualityReporter::new();
        for _ in 0..4 {
            reporter.record_accepted(4.0);
        }
        let quality = reporter.report(&SkipCounter::default());

        let result = MeasurementResult::new(&area, &polygon, &quality, 0, 300.0, 1);
        assert_eq!(result.points_recorded, 4);
        assert_eq!(result.closed_polygon_point_count, 5);
        assert_eq!(result.acres, result.area_square_meters / 4047.0);
        assert_eq!(result.hectares, result.area_square_meters / 10_000.0);
        assert_eq!(result.guntha, result.area_square_meters / 101.17);
        assert_eq!(result.data_quality_percent, 100.0);
        assert_eq!(result.with_index(3).measurement_index, 3);
        assert!(!result.degraded_precision);

        let trimmed = MeasurementResult::new(&area, &polygon, &quality, 2, 300.0, 1);
        assert_eq!(trimmed.trimmed_point_count, 2);
        assert!(trimmed.degraded_precision);
    }
}
