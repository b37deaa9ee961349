//! Area unit conversions.
//!
//! Conversion factors are the fixed values of the reporting format, not the
//! exact legal definitions (1 acre is 4046.8564224 m²).

use serde::{Deserialize, Serialize};

/// Square meters per acre.
pub const SQ_METERS_PER_ACRE: f64 = 4047.0;

/// Square meters per hectare.
pub const SQ_METERS_PER_HECTARE: f64 = 10_000.0;

/// Square meters per guntha (local land unit).
pub const SQ_METERS_PER_GUNTHA: f64 = 101.17;

/// Square meters per cent (secondary local unit).
pub const SQ_METERS_PER_CENT: f64 = 40.4686;

/// An area expressed in every supported unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaUnits {
    pub square_meters: f64,
    pub acres: f64,
    pub hectares: f64,
    pub guntha: f64,
    pub cents: f64,
}

impl AreaUnits {
    /// Derive every unit from an area in square meters.
    pub fn from_square_meters(square_meters: f64) -> Self {
        Self {
            square_meters,
            acres: square_meters / SQ_METERS_PER_ACRE,
            hectares: square_meters / SQ_METERS_PER_HECTARE,
            guntha: square_meters / SQ_METERS_PER_GUNTHA,
            cents: square_meters / SQ_METERS_PER_CENT,
        }
    }
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
