//! Fixed-precision rendering of results for display and sharing.
//!
//! Meters and square meters are rounded to 2 decimals, acre/hectare/guntha/cent
//! to 4. Rounding happens only here; stored and aggregated values keep full
//! precision.

use serde::{Deserialize, Serialize};

use crate::aggregator::AggregateResult;
use crate::area::AreaMode;
use crate::error::Result;
use crate::measurement::MeasurementResult;
use crate::units::round_to;

/// Decimals for meters and square meters.
pub const METRIC_DECIMALS: i32 = 2;

/// Decimals for acres, hectares, guntha and cents.
pub const UNIT_DECIMALS: i32 = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedMeasurement {
    pub measurement_index: u32,
    pub perimeter_meters: f64,
    pub area_square_meters: f64,
    pub acres: f64,
    pub hectares: f64,
    pub guntha: f64,
    pub cents: f64,
    pub points_recorded: u32,
    pub closed_polygon_point_count: u32,
    pub skipped_point_count: u32,
    /// Oldest points left out of the polygon by the recording window cap
    pub trimmed_point_count: u32,
    pub live_distance_meters: f64,
    pub avg_accuracy_meters: f64,
    pub data_quality_percent: f64,
    pub area_mode: AreaMode,
    pub degraded_precision: bool,
}

impl From<&MeasurementResult> for ExportedMeasurement {
    fn from(r: &MeasurementResult) -> Self {
        Self {
            measurement_index: r.measurement_index,
            perimeter_meters: round_to(r.perimeter_meters, METRIC_DECIMALS),
            area_square_meters: round_to(r.area_square_meters, METRIC_DECIMALS),
            acres: round_to(r.acres, UNIT_DECIMALS),
            hectares: round_to(r.hectares, UNIT_DECIMALS),
            guntha: round_to(r.guntha, UNIT_DECIMALS),
            cents: round_to(r.cents, UNIT_DECIMALS),
            points_recorded: r.points_recorded,
            closed_polygon_point_count: r.closed_polygon_point_count,
            skipped_point_count: r.skipped_point_count,
            trimmed_point_count: r.trimmed_point_count,
            live_distance_meters: round_to(r.live_distance_meters, METRIC_DECIMALS),
            avg_accuracy_meters: round_to(r.avg_accuracy_meters, METRIC_DECIMALS),
            data_quality_percent: round_to(r.data_quality_percent, METRIC_DECIMALS),
            area_mode: r.area_mode,
            degraded_precision: r.degraded_precision,
        }
    }
}

impl ExportedMeasurement {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// One-line summary, e.g. `#1: 10000.00 m² (2.4710 acres), perimeter 400.00 m`.
    pub fn summary(&self) -> String {
        format!(
            "#{}: {:.2} m² ({:.4} acres, {:.4} ha, {:.4} guntha), perimeter {:.2} m",
            self.measurement_index,
            self.area_square_meters,
            self.acres,
            self.hectares,
            self.guntha,
            self.perimeter_meters
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedAggregate {
    pub measurement_count: u32,
    pub average_perimeter_meters: f64,
    pub average_area_square_meters: f64,
    pub acres: f64,
    pub hectares: f64,
    pub guntha: f64,
    pub cents: f64,
}

impl From<&AggregateResult> for ExportedAggregate {
    fn from(a: &AggregateResult) -> Self {
        Self {
            measurement_count: a.measurement_count,
            average_perimeter_meters: round_to(a.average_perimeter_meters, METRIC_DECIMALS),
            average_area_square_meters: round_to(a.average_area_square_meters, METRIC_DECIMALS),
            acres: round_to(a.acres, UNIT_DECIMALS),
            hectares: round_to(a.hectares, UNIT_DECIMALS),
            guntha: round_to(a.guntha, UNIT_DECIMALS),
            cents: round_to(a.cents, UNIT_DECIMALS),
        }
    }
}

impl ExportedAggregate {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
