//! Persistence boundary for completed measurements.
//!
//! A store accepts a [`MeasurementResult`] and returns a stored copy with an
//! assigned id and creation timestamp. Statistics are recomputed over every
//! stored result on each call.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::measurement::MeasurementResult;
use crate::units::AreaUnits;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMeasurement {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    pub result: MeasurementResult,
}

/// Statistics over all stored results. Zeroed when the store is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    pub measurement_count: u32,
    pub average_area_square_meters: f64,
    pub average_perimeter_meters: f64,
    pub acres: f64,
    pub hectares: f64,
    pub guntha: f64,
    pub cents: f64,
    pub average_accuracy_meters: f64,
    pub min_area_square_meters: f64,
    pub max_area_square_meters: f64,
}

impl StoreStats {
    pub fn from_results<'a, I>(results: I) -> Self
    where
        I: IntoIterator<Item = &'a MeasurementResult>,
    {
        let mut count = 0u32;
        let mut area_sum = 0.0;
        let mut perimeter_sum = 0.0;
        let mut accuracy_sum = 0.0;
        let mut min_area = f64::INFINITY;
        let mut max_area = f64::NEG_INFINITY;

        for r in results {
            count += 1;
            area_sum += r.area_square_meters;
            perimeter_sum += r.perimeter_meters;
            accuracy_sum += r.avg_accuracy_meters;
            min_area = min_area.min(r.area_square_meters);
            max_area = max_area.max(r.area_square_meters);
        }

        if count == 0 {
            return Self::default();
        }

        let n = count as f64;
        let units = AreaUnits::from_square_meters(area_sum / n);
        Self {
            measurement_count: count,
            average_area_square_meters: units.square_meters,
            average_perimeter_meters: perimeter_sum / n,
            acres: units.acres,
            hectares: units.hectares,
            guntha: units.guntha,
            cents: units.cents,
            average_accuracy_meters: accuracy_sum / n,
            min_area_square_meters: min_area,
            max_area_square_meters: max_area,
        }
    }
}

pub trait MeasurementStore {
    /// Persist a result and return the stored copy.
    fn save(&mut self, result: &MeasurementResult) -> Result<StoredMeasurement>;

    /// All stored measurements, oldest first.
    fn list(&self) -> Result<Vec<StoredMeasurement>>;

    fn get(&self, id: u64) -> Result<Option<StoredMeasurement>>;

    /// Returns false if no measurement had this id.
    fn delete(&mut self, id: u64) -> Result<bool>;

    fn stats(&self) -> Result<StoreStats> {
        let stored = self.list()?;
        Ok(StoreStats::from_results(stored.iter().map(|s| &s.result)))
    }
}

/// Store kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: BTreeMap<u64, StoredMeasurement>,
    next_id: u64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MeasurementStore for InMemoryStore {
    fn save(&mut self, result: &MeasurementResult) -> Result<StoredMeasurement> {
        self.next_id += 1;
        let stored = StoredMeasurement {
            id: self.next_id,
            created_at: Utc::now(),
            result: result.clone(),
        };
        self.entries.insert(stored.id, stored.clone());
        debug!("[InMemoryStore] Saved measurement {}", stored.id);
        Ok(stored)
    }

    fn list(&self) -> Result<Vec<StoredMeasurement>> {
        Ok(self.entries.values().cloned().collect())
    }

    fn get(&self, id: u64) -> Result<Option<StoredMeasurement>> {
        Ok(self.entries.get(&id).cloned())
    }

    fn delete(&mut self, id: u64) -> Result<bool> {
        Ok(self.entries.remove(&id).is_some())
    }
}
