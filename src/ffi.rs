//! FFI bindings for mobile platforms (iOS/Android).
//!
//! A process-wide [`SurveyController`] backs every exported function so the
//! app never has to carry session state across the boundary. Results cross
//! as JSON strings; failures are reported as `{"error": "..."}` objects
//! rather than thrown.

use std::sync::Mutex;

use log::{info, warn};
use once_cell::sync::Lazy;
use serde_json::json;

use crate::aggregator::AverageOutcome;
use crate::controller::SurveyController;
use crate::error::{ProviderError, SurveyError};
use crate::export::{ExportedAggregate, ExportedMeasurement};
use crate::filter::FilterDecision;
use crate::session::{SessionState, TickOutcome};
use crate::{init_logging, GeoFix, SurveyConfig};

/// Global controller instance.
pub static CONTROLLER: Lazy<Mutex<SurveyController>> =
    Lazy::new(|| Mutex::new(SurveyController::default()));

/// Run `f` with the global controller locked.
pub fn with_controller<F, R>(f: F) -> R
where
    F: FnOnce(&mut SurveyController) -> R,
{
    // A panic mid-call leaves the controller usable; state is replaced on next start
    let mut controller = CONTROLLER
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    f(&mut controller)
}

fn error_json(error: &SurveyError) -> String {
    json!({ "error": error.to_string() }).to_string()
}

/// Initialize logging (call once at app startup).
#[uniffi::export]
pub fn survey_init() {
    init_logging();
    info!("[LandSurvey] Initialized");
}

/// Start a measurement with the given configuration.
/// Returns false if the configuration is invalid.
#[uniffi::export]
pub fn survey_start(config: SurveyConfig) -> bool {
    init_logging();
    with_controller(|c| match c.set_config(config).and_then(|_| c.start()) {
        Ok(()) => true,
        Err(e) => {
            warn!("[LandSurvey] Start failed: {}", e);
            false
        }
    })
}

/// Deliver a fix from the platform location API.
/// Returns false when no session is accepting fixes.
#[uniffi::export]
pub fn survey_push_fix(fix: GeoFix) -> bool {
    with_controller(|c| c.push_fix(fix).is_ok())
}

/// Sample the latest fix. Returns the filter decision, or `None` when
/// nothing was evaluated.
#[uniffi::export]
pub fn survey_tick() -> Option<FilterDecision> {
    with_controller(|c| match c.tick() {
        Ok(TickOutcome::Evaluated(decision)) => Some(decision),
        Ok(TickOutcome::NoFix) | Err(_) => None,
    })
}

/// Abort the active measurement on a location provider failure.
#[uniffi::export]
pub fn survey_provider_error(error: ProviderError) {
    let err = with_controller(|c| c.provider_error(error));
    warn!("[LandSurvey] Measurement aborted: {}", err);
}

/// Current session state.
#[uniffi::export]
pub fn survey_state() -> SessionState {
    with_controller(|c| c.state())
}

/// Stop the measurement and return the rounded result as JSON.
#[uniffi::export]
pub fn survey_stop_json() -> String {
    with_controller(|c| match c.stop() {
        Ok(result) => {
            info!(
                "[LandSurvey] Measurement {}: {:.1} m², perimeter {:.1} m",
                result.measurement_index, result.area_square_meters, result.perimeter_meters
            );
            ExportedMeasurement::from(&result)
                .to_json()
                .unwrap_or_else(|e| error_json(&e))
        }
        Err(e) => {
            warn!("[LandSurvey] Stop failed: {}", e);
            error_json(&e)
        }
    })
}

/// Live running distance in meters; 0 when no session is active.
#[uniffi::export]
pub fn survey_live_distance() -> f64 {
    with_controller(|c| c.live_distance_meters().unwrap_or(0.0))
}

/// Average over stored results as JSON, or `{"status": "unavailable", ...}`
/// with fewer than two.
#[uniffi::export]
pub fn survey_average_json() -> String {
    with_controller(|c| match c.compute_average() {
        AverageOutcome::Available(aggregate) => ExportedAggregate::from(&aggregate)
            .to_json()
            .unwrap_or_else(|e| error_json(&e)),
        AverageOutcome::Unavailable { measurement_count } => json!({
            "status": "unavailable",
            "measurement_count": measurement_count,
        })
        .to_string(),
    })
}

/// All stored results, rounded, as a JSON array.
#[uniffi::export]
pub fn survey_results_json() -> String {
    with_controller(|c| {
        let exported: Vec<ExportedMeasurement> =
            c.results().iter().map(ExportedMeasurement::from).collect();
        serde_json::to_string(&exported).unwrap_or_else(|e| error_json(&e.into()))
    })
}

/// Drop every stored result.
#[uniffi::export]
pub fn survey_clear_results() {
    with_controller(|c| c.clear_results());
    info!("[LandSurvey] Results cleared");
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test: the controller is process-wide
    #[test]
    fn test_ffi_round_trip() {
        survey_clear_results();
        assert!(!survey_push_fix(GeoFix::new(0.0, 0.0, 3.0, 0)));
        assert!(survey_stop_json().contains("error"));

        let square = [
            (0.0, 0.0),
            (0.0, 0.0009044),
            (0.0009044, 0.0009044),
            (0.0009044, 0.0),
        ];
        for _ in 0..2 {
            assert!(survey_start(SurveyConfig::default()));
            for (i, (lat, lng)) in square.iter().enumerate() {
                assert!(survey_push_fix(GeoFix::new(*lat, *lng, 3.0, i as i64 * 1000)));
                assert_eq!(survey_tick(), Some(FilterDecision::Accept));
            }
            assert!(survey_live_distance() > 290.0);
            let stopped: serde_json::Value = serde_json::from_str(&survey_stop_json()).unwrap();
            assert!(stopped["area_square_meters"].as_f64().unwrap() > 9_900.0);
        }

        let average: serde_json::Value = serde_json::from_str(&survey_average_json()).unwrap();
        assert_eq!(average["measurement_count"], 2);

        survey_clear_results();
        let average: serde_json::Value = serde_json::from_str(&survey_average_json()).unwrap();
        assert_eq!(average["status"], "unavailable");
        assert_eq!(survey_state(), SessionState::Idle);
    }
}
