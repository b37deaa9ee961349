//! Unified error handling for the land-survey library.
//!
//! Fix rejections are expected outcomes and travel as [`FilterDecision`]s, not
//! errors. Only [`SurveyError::InsufficientPoints`] and [`SurveyError::Provider`]
//! abort a session; everything else is either recovered internally
//! (projection failure) or describes misuse of the API.
//!
//! [`FilterDecision`]: crate::filter::FilterDecision

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Terminal errors delivered by the location collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum ProviderError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    PositionUnavailable,
    #[error("location request timed out")]
    Timeout,
}

/// Unified error type for survey operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SurveyError {
    /// Fix accuracy worse than the configured threshold
    #[error("fix accuracy {accuracy_meters:.1}m exceeds threshold {threshold_meters:.1}m")]
    LowAccuracyFix {
        accuracy_meters: f64,
        threshold_meters: f64,
    },
    /// Fix too close to the previously accepted point
    #[error("fix moved {distance_meters:.2}m, minimum {threshold_meters:.2}m required")]
    JitterFix {
        distance_meters: f64,
        threshold_meters: f64,
    },
    /// Session stopped before enough points were accepted
    #[error("{point_count} points recorded, minimum {minimum_required} required")]
    InsufficientPoints {
        point_count: usize,
        minimum_required: usize,
    },
    /// UTM projection could not be applied
    #[error("projection failed: {message}")]
    ProjectionFailure { message: String },
    /// Location provider failed; surfaced verbatim
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// Event delivered to a session that already stopped
    #[error("session already stopped")]
    SessionStopped,
    /// Operation requires an active session
    #[error("no active session")]
    NoActiveSession,
    /// Configuration error
    #[error("configuration error: {message}")]
    InvalidConfig { message: String },
    /// Persistence/storage error
    #[error("persistence error: {message}")]
    Persistence { message: String },
    /// JSON encode/decode error
    #[error("serialization error: {message}")]
    Serialization { message: String },
    /// Generic internal error
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl From<serde_json::Error> for SurveyError {
    fn from(err: serde_json::Error) -> Self {
        SurveyError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Result type alias for survey operations.
pub type Result<T> = std::result::Result<T, SurveyError>;

/// Extension trait for converting Option to SurveyError.
pub trait OptionExt<T> {
    /// Convert Option to Result with insufficient points error.
    fn ok_or_insufficient_points(self, point_count: usize, minimum: usize) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_insufficient_points(self, point_count: usize, minimum: usize) -> Result<T> {
        self.ok_or(SurveyError::InsufficientPoints {
            point_count,
            minimum_required: minimum,
        })
    }
}
