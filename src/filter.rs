//! Fix filtering.
//!
//! Every candidate fix is checked in two stages:
//! 1. Accuracy: a fix whose accuracy radius exceeds the threshold is rejected,
//!    no matter how far it is from the previous point.
//! 2. Movement: a fix closer than the minimum distance to the last accepted
//!    point is rejected as jitter.
//!
//! The first fix of a session only has to pass the accuracy check.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::SurveyError;
use crate::geo_utils::haversine_distance;
use crate::{GeoFix, GpsPoint, SurveyConfig};

/// Outcome of evaluating one fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum FilterDecision {
    Accept,
    RejectLowAccuracy,
    RejectJitter,
}

impl FilterDecision {
    pub fn is_accept(self) -> bool {
        self == FilterDecision::Accept
    }
}

/// Stateless accuracy/movement filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixFilter {
    accuracy_threshold_meters: f64,
    min_distance_threshold_meters: f64,
}

impl FixFilter {
    pub fn new(accuracy_threshold_meters: f64, min_distance_threshold_meters: f64) -> Self {
        Self {
            accuracy_threshold_meters,
            min_distance_threshold_meters,
        }
    }

    pub fn from_config(config: &SurveyConfig) -> Self {
        Self::new(
            config.accuracy_threshold_meters,
            config.min_distance_threshold_meters,
        )
    }

    /// Decide whether `fix` should be appended after `last_accepted`.
    pub fn evaluate(&self, fix: &GeoFix, last_accepted: Option<&GpsPoint>) -> FilterDecision {
        match self.check(fix, last_accepted) {
            Ok(()) => FilterDecision::Accept,
            Err(SurveyError::JitterFix { distance_meters, .. }) => {
                debug!("[FixFilter] Jitter: moved {:.2}m", distance_meters);
                FilterDecision::RejectJitter
            }
            Err(err) => {
                debug!("[FixFilter] Low accuracy: {}", err);
                FilterDecision::RejectLowAccuracy
            }
        }
    }

    /// Same rules as [`FixFilter::evaluate`], reporting the rejection detail.
    pub fn check(&self, fix: &GeoFix, last_accepted: Option<&GpsPoint>) -> Result<(), SurveyError> {
        // NaN accuracy or coordinates make the fix unusable
        if !(fix.accuracy_meters <= self.accuracy_threshold_meters) || !fix.point().is_valid() {
            return Err(SurveyError::LowAccuracyFix {
                accuracy_meters: fix.accuracy_meters,
                threshold_meters: self.accuracy_threshold_meters,
            });
        }

        if let Some(prev) = last_accepted {
            let distance = haversine_distance(prev, &fix.point());
            if distance < self.min_distance_threshold_meters {
                return Err(SurveyError::JitterFix {
                    distance_meters: distance,
                    threshold_meters: self.min_distance_threshold_meters,
                });
            }
        }

        Ok(())
    }
}

/// Session-scoped count of rejected fixes, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipCounter {
    pub low_accuracy: u32,
    pub jitter: u32,
}

impl SkipCounter {
    /// Record a decision; accepted fixes are ignored.
    pub fn record(&mut self, decision: FilterDecision) {
        match decision {
            FilterDecision::Accept => {}
            FilterDecision::RejectLowAccuracy => self.low_accuracy += 1,
            FilterDecision::RejectJitter => self.jitter += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.low_accuracy + self.jitter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> FixFilter {
        FixFilter::new(10.0, 2.0)
    }

    #[test]
    fn test_first_fix_accepted_when_accurate() {
        let fix = GeoFix::new(18.5, 73.8, 3.0, 0);
        assert_eq!(filter().evaluate(&fix, None), FilterDecision::Accept);
    }

    #[test]
    fn test_first_fix_rejected_when_inaccurate() {
        let fix = GeoFix::new(18.5, 73.8, 12.0, 0);
        assert_eq!(filter().evaluate(&fix, None), FilterDecision::RejectLowAccuracy);
    }

    #[test]
    fn test_accuracy_checked_before_distance() {
        let prev = GpsPoint::new(18.5, 73.8);
        // ~1.1 km away but inaccurate
        let far = GeoFix::new(18.51, 73.8, 10.5, 0);
        assert_eq!(filter().evaluate(&far, Some(&prev)), FilterDecision::RejectLowAccuracy);
        // same spot and inaccurate: still low accuracy, not jitter
        let near = GeoFix::new(18.5, 73.8, 50.0, 0);
        assert_eq!(filter().evaluate(&near, Some(&prev)), FilterDecision::RejectLowAccuracy);
    }

    #[test]
    fn test_accuracy_at_threshold_passes() {
        let fix = GeoFix::new(18.5, 73.8, 10.0, 0);
        assert_eq!(filter().evaluate(&fix, None), FilterDecision::Accept);
    }

    #[test]
    fn test_jitter_rejected() {
        let prev = GpsPoint::new(18.5, 73.8);
        // ~1.1 m north
        let fix = GeoFix::new(18.50001, 73.8, 3.0, 0);
        assert_eq!(filter().evaluate(&fix, Some(&prev)), FilterDecision::RejectJitter);
    }

    #[test]
    fn test_movement_accepted() {
        let prev = GpsPoint::new(18.5, 73.8);
        // ~5.5 m north
        let fix = GeoFix::new(18.50005, 73.8, 3.0, 0);
        assert_eq!(filter().evaluate(&fix, Some(&prev)), FilterDecision::Accept);
    }

    #[test]
    fn test_invalid_coordinates_rejected() {
        let fix = GeoFix::new(f64::NAN, 73.8, 3.0, 0);
        assert_eq!(filter().evaluate(&fix, None), FilterDecision::RejectLowAccuracy);
        let fix = GeoFix::new(18.5, 73.8, f64::NAN, 0);
        assert_eq!(filter().evaluate(&fix, None), FilterDecision::RejectLowAccuracy);
    }

    #[test]
    fn test_skip_counter() {
        let mut skips = SkipCounter::default();
        skips.record(FilterDecision::Accept);
        skips.record(FilterDecision::RejectJitter);
        skips.record(FilterDecision::RejectLowAccuracy);
        skips.record(FilterDecision::RejectLowAccuracy);
        assert_eq!(skips.low_accuracy, 2);
        assert_eq!(skips.jitter, 1);
        assert_eq!(skips.total(), 3);
    }
}
