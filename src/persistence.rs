//! # SQLite Measurement Store
//!
//! Stores completed measurements in SQLite. Each row keeps the creation time
//! and the full result as JSON; area and perimeter are duplicated into
//! columns so they can be inspected without decoding.

use chrono::{DateTime, Utc};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{Result, SurveyError};
use crate::measurement::MeasurementResult;
use crate::store::{MeasurementStore, StoredMeasurement};

impl From<rusqlite::Error> for SurveyError {
    fn from(err: rusqlite::Error) -> Self {
        SurveyError::Persistence {
            message: err.to_string(),
        }
    }
}

/// Measurement store backed by a SQLite database.
pub struct SqliteStore {
    db: Connection,
}

impl SqliteStore {
    /// Open (or create) a store at the given database path.
    pub fn new(db_path: &str) -> Result<Self> {
        let db = Connection::open(db_path)?;
        Self::init_schema(&db)?;
        info!("[SqliteStore] Opened {}", db_path);
        Ok(Self { db })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        Self::new(":memory:")
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS measurements (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at INTEGER NOT NULL,
                area_square_meters REAL NOT NULL,
                perimeter_meters REAL NOT NULL,
                data TEXT NOT NULL
            );
        "#,
        )?;
        Ok(())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<(i64, i64, String)> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?))
    }

    fn decode((id, created_ms, data): (i64, i64, String)) -> Result<StoredMeasurement> {
        let created_at = DateTime::<Utc>::from_timestamp_millis(created_ms).ok_or_else(|| {
            SurveyError::Persistence {
                message: format!("invalid timestamp {} for measurement {}", created_ms, id),
            }
        })?;
        let result: MeasurementResult = serde_json::from_str(&data)?;
        Ok(StoredMeasurement {
            id: id as u64,
            created_at,
            result,
        })
    }
}

impl MeasurementStore for SqliteStore {
    fn save(&mut self, result: &MeasurementResult) -> Result<StoredMeasurement> {
        let created_at = Utc::now();
        let data = serde_json::to_string(result)?;
        self.db.execute(
            "INSERT INTO measurements (created_at, area_square_meters, perimeter_meters, data)
             VALUES (?, ?, ?, ?)",
            params![
                created_at.timestamp_millis(),
                result.area_square_meters,
                result.perimeter_meters,
                data
            ],
        )?;
        let id = self.db.last_insert_rowid() as u64;
        info!("[SqliteStore] Saved measurement {}", id);

        Ok(StoredMeasurement {
            id,
            // Round-trip precision of the stored column
            created_at: DateTime::<Utc>::from_timestamp_millis(created_at.timestamp_millis())
                .unwrap_or(created_at),
            result: result.clone(),
        })
    }

    fn list(&self) -> Result<Vec<StoredMeasurement>> {
        let mut stmt = self
            .db
            .prepare("SELECT id, created_at, data FROM measurements ORDER BY id")?;
        let rows = stmt
            .query_map([], Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(Self::decode).collect()
    }

    fn get(&self, id: u64) -> Result<Option<StoredMeasurement>> {
        let row = self
            .db
            .query_row(
                "SELECT id, created_at, data FROM measurements WHERE id = ?",
                params![id as i64],
                Self::from_row,
            )
            .optional()?;
        row.map(Self::decode).transpose()
    }

    fn delete(&mut self, id: u64) -> Result<bool> {
        let deleted = self
            .db
            .execute("DELETE FROM measurements WHERE id = ?", params![id as i64])?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::AreaMode;
    use crate::units::AreaUnits;

    fn result(area: f64) -> MeasurementResult {
        let units = AreaUnits::from_square_meters(area);
        MeasurementResult {
            perimeter_meters: 4.0 * area.sqrt(),
            area_square_meters: area,
            acres: units.acres,
            hectares: units.hectares,
            guntha: units.guntha,
            cents: units.cents,
            points_recorded: 20,
            closed_polygon_point_count: 21,
            avg_accuracy_meters: 4.5,
            skipped_point_count: 3,
            data_quality_percent: 20.0 / 23.0 * 100.0,
            area_mode: AreaMode::Projected,
            degraded_precision: false,
            trimmed_point_count: 0,
            live_distance_meters: 4.0 * area.sqrt(),
            measurement_index: 1,
        }
    }

    #[test]
    fn test_save_and_get() {
        let mut store = SqliteStore::in_memory().unwrap();
        let saved = store.save(&result(2500.0)).unwrap();
        let loaded = store.get(saved.id).unwrap().unwrap();
        assert_eq!(loaded, saved);
        assert!(store.get(saved.id + 1).unwrap().is_none());
    }

    #[test]
    fn test_list_and_delete() {
        let mut store = SqliteStore::in_memory().unwrap();
        let a = store.save(&result(100.0)).unwrap();
        let b = store.save(&result(400.0)).unwrap();
        let ids: Vec<u64> = store.list().unwrap().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);

        assert!(store.delete(a.id).unwrap());
        assert!(!store.delete(a.id).unwrap());
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_stats_over_stored_rows() {
        let mut store = SqliteStore::in_memory().unwrap();
        store.save(&result(100.0)).unwrap();
        store.save(&result(300.0)).unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats.measurement_count, 2);
        assert_eq!(stats.average_area_square_meters, 200.0);
        assert_eq!(stats.average_accuracy_meters, 4.5);
    }
}
