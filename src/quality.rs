//! Accuracy and skip-rate statistics for one measurement.

use serde::{Deserialize, Serialize};

use crate::filter::SkipCounter;

/// Coarse label for the mean fix accuracy of a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum QualityGrade {
    /// Mean accuracy under 5 m
    Excellent,
    /// Under 10 m
    Good,
    /// Under 20 m
    Fair,
    Poor,
}

impl QualityGrade {
    pub fn from_accuracy(avg_accuracy_meters: f64) -> Self {
        if avg_accuracy_meters < 5.0 {
            QualityGrade::Excellent
        } else if avg_accuracy_meters < 10.0 {
            QualityGrade::Good
        } else if avg_accuracy_meters < 20.0 {
            QualityGrade::Fair
        } else {
            QualityGrade::Poor
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub avg_accuracy_meters: f64,
    pub best_accuracy_meters: f64,
    pub worst_accuracy_meters: f64,
    pub accepted_count: u32,
    pub skipped_count: u32,
    /// accepted / (accepted + skipped) × 100; exactly 100 with no skips
    pub data_quality_percent: f64,
    pub grade: QualityGrade,
}

/// Running accuracy statistics over every accepted fix of a session.
///
/// Covers the full session, including points dropped from the bounded
/// recording window.
#[derive(Debug, Clone, Default)]
pub struct QualityReporter {
    accuracy_sum: f64,
    best_accuracy: Option<f64>,
    worst_accuracy: Option<f64>,
    accepted: u32,
}

impl QualityReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_accepted(&mut self, accuracy_meters: f64) {
        self.accuracy_sum += accuracy_meters;
        self.accepted += 1;
        self.best_accuracy = Some(match self.best_accuracy {
            Some(best) => best.min(accuracy_meters),
            None => accuracy_meters,
        });
        self.worst_accuracy = Some(match self.worst_accuracy {
            Some(worst) => worst.max(accuracy_meters),
            None => accuracy_meters,
        });
    }

    pub fn accepted(&self) -> u32 {
        self.accepted
    }

    pub fn avg_accuracy_meters(&self) -> f64 {
        if self.accepted == 0 {
            return 0.0;
        }
        self.accuracy_sum / self.accepted as f64
    }

    pub fn report(&self, skips: &SkipCounter) -> QualityReport {
        let avg_accuracy_meters = self.avg_accuracy_meters();
        QualityReport {
            avg_accuracy_meters,
            best_accuracy_meters: self.best_accuracy.unwrap_or(0.0),
            worst_accuracy_meters: self.worst_accuracy.unwrap_or(0.0),
            accepted_count: self.accepted,
            skipped_count: skips.total(),
            data_quality_percent: data_quality_percent(self.accepted, skips.total()),
            grade: QualityGrade::from_accuracy(avg_accuracy_meters),
        }
    }
}

/// Share of evaluated fixes that were accepted, in percent.
pub fn data_quality_percent(accepted: u32, skipped: u32) -> f64 {
    if skipped == 0 {
        return 100.0;
    }
    accepted as f64 / (accepted + skipped) as f64 * 100.0
}
