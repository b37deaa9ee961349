//! # Land Survey
//!
//! Turns a boundary walk recorded as noisy GPS fixes into a closed polygon and
//! reports its perimeter and area in several units.
//!
//! This library provides:
//! - Fix filtering by accuracy and minimum movement
//! - Polygon closing and dual-mode (flat / UTM) area computation
//! - Quality statistics and averaging over repeated walk-throughs
//! - An explicit session state machine plus a tokio-driven recorder
//!
//! ## Features
//!
//! - **`persistence`** - Enable SQLite storage of measurement results
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use land_survey::{GeoFix, SurveyConfig, SurveyController};
//!
//! let mut controller = SurveyController::new(SurveyConfig::default());
//! controller.start().unwrap();
//!
//! let corners = [(0.0, 0.0), (0.0, 0.0009044), (0.0009044, 0.0009044), (0.0009044, 0.0)];
//! for (i, (lat, lng)) in corners.iter().enumerate() {
//!     controller.push_fix(GeoFix::new(*lat, *lng, 3.0, i as i64 * 1000)).unwrap();
//!     controller.tick().unwrap();
//! }
//!
//! let result = controller.stop().unwrap();
//! println!("{:.0} m² ({:.4} acres)", result.area_square_meters, result.acres);
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{OptionExt, ProviderError, Result, SurveyError};

// Geographic utilities (distance, bounds, center calculations)
pub mod geo_utils;

// Unit conversions (acres, hectares, guntha, cents)
pub mod units;
pub use units::AreaUnits;

// Fix filtering and skip accounting
pub mod filter;
pub use filter::{FilterDecision, FixFilter, SkipCounter};

// Live running distance
pub mod accumulator;
pub use accumulator::DistanceAccumulator;

// Polygon closing
pub mod polygon;
pub use polygon::{ClosedPolygon, PolygonCloser};

// Planar projections (flat equirectangular and UTM)
pub mod projection;
pub use projection::{UtmProjection, UtmZone};

// Perimeter and area computation
pub mod area;
pub use area::{AreaEngine, AreaMode, AreaResult};

// Quality statistics
pub mod quality;
pub use quality::{QualityGrade, QualityReport, QualityReporter};

// Completed measurement results
pub mod measurement;
pub use measurement::MeasurementResult;

// Averaging over repeated walk-throughs
pub mod aggregator;
pub use aggregator::{AggregateResult, AverageOutcome, MeasurementAggregator, MeasurementSpread};

// Session state machine
pub mod session;
pub use session::{Session, SessionEvent, SessionState, TickOutcome};

// Controller owning the active session and the results list
pub mod controller;
pub use controller::SurveyController;

// Async recorder (push-based fixes sampled by a periodic tick)
pub mod recorder;
pub use recorder::{
    ChannelLocationSource, LocationEvent, LocationSource, RecorderHandle, RecordingProgress,
    SessionRecorder,
};

// Persistence collaborator boundary
pub mod store;
pub use store::{InMemoryStore, MeasurementStore, StoreStats, StoredMeasurement};

// SQLite-backed store
#[cfg(feature = "persistence")]
pub mod persistence;
#[cfg(feature = "persistence")]
pub use persistence::SqliteStore;

// Fixed-precision export
pub mod export;
pub use export::{ExportedAggregate, ExportedMeasurement};

// FFI bindings for mobile platforms (iOS/Android)
#[cfg(feature = "ffi")]
pub mod ffi;

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
pub(crate) fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("LandSurveyRust"),
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
pub(crate) fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use land_survey::GpsPoint;
/// let point = GpsPoint::new(18.5204, 73.8567); // Pune
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// One instantaneous location reading from the device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct GeoFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy radius reported by the device (meters)
    pub accuracy_meters: f64,
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
}

impl GeoFix {
    pub fn new(latitude: f64, longitude: f64, accuracy_meters: f64, timestamp: i64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_meters,
            timestamp,
        }
    }

    /// Position of this fix without accuracy/time metadata.
    pub fn point(&self) -> GpsPoint {
        GpsPoint::new(self.latitude, self.longitude)
    }
}

/// A fix accepted into the active session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecordedPoint {
    pub fix: GeoFix,
    /// 1-based acceptance order within the session
    pub sequence: u64,
}

impl RecordedPoint {
    pub fn point(&self) -> GpsPoint {
        self.fix.point()
    }
}

/// Bounding box for a point set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from GPS points.
    pub fn from_points(points: &[GpsPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        Some(geo_utils::compute_bounds(points))
    }

    /// Latitude extent in degrees.
    pub fn lat_range(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Longitude extent in degrees.
    pub fn lng_range(&self) -> f64 {
        self.max_lng - self.min_lng
    }
}

/// Configuration shared by every component of a measurement session.
///
/// Captured once at session start and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct SurveyConfig {
    /// Fixes with a worse accuracy radius are rejected.
    /// Default: 20.0 meters
    pub accuracy_threshold_meters: f64,

    /// Fixes closer than this to the last accepted point are rejected as jitter.
    /// Default: 2.0 meters
    pub min_distance_threshold_meters: f64,

    /// First-to-last gap above which the closer appends a closing point.
    /// Default: 5.0 meters
    pub closure_threshold_meters: f64,

    /// Latitude or longitude extent above which area uses UTM projection.
    /// Default: 0.01 degrees (~1.1 km)
    pub projected_extent_degrees: f64,

    /// Accepted points retained per session before the oldest are dropped.
    /// Default: 10000
    pub max_recorded_points: u32,

    /// Recording tick period for the async recorder.
    /// Default: 1000 ms
    pub tick_interval_ms: u64,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            accuracy_threshold_meters: 20.0,
            min_distance_threshold_meters: 2.0,
            closure_threshold_meters: 5.0,
            projected_extent_degrees: 0.01,
            max_recorded_points: 10_000,
            tick_interval_ms: 1000,
        }
    }
}

impl SurveyConfig {
    /// Parse a configuration from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SurveyConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations no session could run with.
    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("accuracy_threshold_meters", self.accuracy_threshold_meters),
            (
                "min_distance_threshold_meters",
                self.min_distance_threshold_meters,
            ),
            ("closure_threshold_meters", self.closure_threshold_meters),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(SurveyError::InvalidConfig {
                    message: format!("{} must be a non-negative number, got {}", name, value),
                });
            }
        }
        if !self.projected_extent_degrees.is_finite() || self.projected_extent_degrees <= 0.0 {
            return Err(SurveyError::InvalidConfig {
                message: format!(
                    "projected_extent_degrees must be positive, got {}",
                    self.projected_extent_degrees
                ),
            });
        }
        if (self.max_recorded_points as usize) < polygon::MIN_POLYGON_POINTS {
            return Err(SurveyError::InvalidConfig {
                message: format!(
                    "max_recorded_points must be at least {}, got {}",
                    polygon::MIN_POLYGON_POINTS,
                    self.max_recorded_points
                ),
            });
        }
        if self.tick_interval_ms == 0 {
            return Err(SurveyError::InvalidConfig {
                message: "tick_interval_ms must be positive".to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
