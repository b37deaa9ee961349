//! Reconciling repeated walk-throughs of the same parcel.
//!
//! Results are kept in an append-only list. The average needs at least two
//! measurements; unit conversions are re-derived from the mean area rather
//! than averaged independently.

use serde::{Deserialize, Serialize};

use crate::measurement::MeasurementResult;
use crate::units::AreaUnits;

/// Minimum number of results an average is computed over.
pub const MIN_RESULTS_FOR_AVERAGE: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub average_perimeter_meters: f64,
    pub average_area_square_meters: f64,
    pub acres: f64,
    pub hectares: f64,
    pub guntha: f64,
    pub cents: f64,
    pub measurement_count: u32,
}

impl AggregateResult {
    fn from_means(area: f64, perimeter: f64, count: usize) -> Self {
        let units = AreaUnits::from_square_meters(area);
        Self {
            average_perimeter_meters: perimeter,
            average_area_square_meters: units.square_meters,
            acres: units.acres,
            hectares: units.hectares,
            guntha: units.guntha,
            cents: units.cents,
            measurement_count: count as u32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AverageOutcome {
    Available(AggregateResult),
    /// Fewer than two results stored
    Unavailable { measurement_count: u32 },
}

impl AverageOutcome {
    pub fn available(self) -> Option<AggregateResult> {
        match self {
            AverageOutcome::Available(aggregate) => Some(aggregate),
            AverageOutcome::Unavailable { .. } => None,
        }
    }
}

/// Area spread across stored results.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSpread {
    pub min_area_square_meters: f64,
    pub max_area_square_meters: f64,
    /// (max - min) / mean × 100
    pub relative_spread_percent: f64,
}

#[derive(Debug, Clone, Default)]
pub struct MeasurementAggregator {
    results: Vec<MeasurementResult>,
}

impl MeasurementAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a result and return its 1-based index.
    pub fn push(&mut self, result: MeasurementResult) -> u32 {
        self.results.push(result);
        self.results.len() as u32
    }

    /// Index the next pushed result will get.
    pub fn next_index(&self) -> u32 {
        self.results.len() as u32 + 1
    }

    pub fn results(&self) -> &[MeasurementResult] {
        &self.results
    }

    pub fn latest(&self) -> Option<&MeasurementResult> {
        self.results.last()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn clear(&mut self) {
        self.results.clear();
    }

    pub fn compute_average(&self) -> AverageOutcome {
        average_of(&self.results)
    }

    /// Min/max area and relative spread; `None` with fewer than two results.
    pub fn spread(&self) -> Option<MeasurementSpread> {
        if self.results.len() < MIN_RESULTS_FOR_AVERAGE {
            return None;
        }
        let areas = self.results.iter().map(|r| r.area_square_meters);
        let min = areas.clone().fold(f64::INFINITY, f64::min);
        let max = areas.clone().fold(f64::NEG_INFINITY, f64::max);
        let mean = areas.sum::<f64>() / self.results.len() as f64;
        let relative_spread_percent = if mean > 0.0 {
            (max - min) / mean * 100.0
        } else {
            0.0
        };
        Some(MeasurementSpread {
            min_area_square_meters: min,
            max_area_square_meters: max,
            relative_spread_percent,
        })
    }
}

/// Mean area and perimeter over `results`.
pub fn average_of(results: &[MeasurementResult]) -> AverageOutcome {
    if results.len() < MIN_RESULTS_FOR_AVERAGE {
        return AverageOutcome::Unavailable {
            measurement_count: results.len() as u32,
        };
    }
    let n = results.len() as f64;
    let area = results.iter().map(|r| r.area_square_meters).sum::<f64>() / n;
    let perimeter = results.iter().map(|r| r.perimeter_meters).sum::<f64>() / n;
    AverageOutcome::Available(AggregateResult::from_means(area, perimeter, results.len()))
}
