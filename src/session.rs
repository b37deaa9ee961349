//! # Measurement Session
//!
//! One boundary walk, from start to stop, as an explicit state machine.
//!
//! Fixes arrive asynchronously from the location source; a fixed-period tick
//! samples the most recently delivered fix and runs it through the filter.
//! A tick does not guarantee a fresh fix, so the same fix can be evaluated on
//! several ticks. That is intended: a stationary walker simply produces
//! jitter rejections.
//!
//! ```text
//!                 Start              FixArrived
//!   Idle ──────────────▶ AwaitingFirstFix ──────────▶ Recording ◀─┐
//!     │                       │                        │  │       │ FixArrived / Tick
//!     │                       │                        │  └───────┘
//!     └──── Stop / ProviderError ─────────────────────▶ Stopped
//! ```
//!
//! ## Recording window
//!
//! Accepted points are kept in a window capped at `max_recorded_points`.
//! Once full, the oldest point is dropped for each new one. The live
//! distance, accepted count and accuracy statistics keep covering the whole
//! session; polygon closing and area use the retained window. The number of
//! dropped points is reported in the result.

use std::collections::VecDeque;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::accumulator::DistanceAccumulator;
use crate::area::AreaEngine;
use crate::error::{ProviderError, Result, SurveyError};
use crate::filter::{FilterDecision, FixFilter, SkipCounter};
use crate::measurement::MeasurementResult;
use crate::polygon::PolygonCloser;
use crate::quality::QualityReporter;
use crate::{GeoFix, GpsPoint, RecordedPoint, SurveyConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum SessionState {
    Idle,
    AwaitingFirstFix,
    Recording,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    Start,
    FixArrived(GeoFix),
    Tick,
    Stop,
    ProviderError(ProviderError),
}

/// What a tick did with the latest fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickOutcome {
    /// No fix has been delivered yet
    NoFix,
    Evaluated(FilterDecision),
}

impl SessionState {
    /// State after `event`. Any event on a stopped session is an error.
    pub fn next(self, event: &SessionEvent) -> Result<SessionState> {
        use SessionState::*;

        let next = match (self, event) {
            (Stopped, _) => return Err(SurveyError::SessionStopped),
            (_, SessionEvent::Stop) | (_, SessionEvent::ProviderError(_)) => Stopped,
            (Idle, SessionEvent::Start) => AwaitingFirstFix,
            (Idle, _) => Idle,
            (AwaitingFirstFix, SessionEvent::FixArrived(_)) => Recording,
            (AwaitingFirstFix, _) => AwaitingFirstFix,
            (Recording, _) => Recording,
        };
        Ok(next)
    }
}

/// State owned by one measurement. Created fresh per walk, never reused.
#[derive(Debug)]
pub struct Session {
    config: SurveyConfig,
    filter: FixFilter,
    closer: PolygonCloser,
    area_engine: AreaEngine,

    state: SessionState,
    latest_fix: Option<GeoFix>,
    points: VecDeque<RecordedPoint>,
    accumulator: DistanceAccumulator,
    skips: SkipCounter,
    quality: QualityReporter,
    trimmed: u32,
}

impl Session {
    pub fn new(config: SurveyConfig) -> Self {
        Self {
            filter: FixFilter::from_config(&config),
            closer: PolygonCloser::new(config.closure_threshold_meters),
            area_engine: AreaEngine::from_config(&config),
            config,
            state: SessionState::Idle,
            latest_fix: None,
            points: VecDeque::new(),
            accumulator: DistanceAccumulator::new(),
            skips: SkipCounter::default(),
            quality: QualityReporter::new(),
            trimmed: 0,
        }
    }

    fn apply(&mut self, event: &SessionEvent) -> Result<SessionState> {
        let next = self.state.next(event)?;
        if next != self.state {
            debug!("[Session] {:?} -> {:?}", self.state, next);
        }
        self.state = next;
        Ok(next)
    }

    /// Begin waiting for fixes.
    pub fn start(&mut self) -> Result<()> {
        self.apply(&SessionEvent::Start)?;
        Ok(())
    }

    /// Record a fix delivered by the location source; evaluated on the next tick.
    pub fn on_fix(&mut self, fix: GeoFix) -> Result<()> {
        match self.apply(&SessionEvent::FixArrived(fix))? {
            SessionState::AwaitingFirstFix | SessionState::Recording => {
                self.latest_fix = Some(fix);
            }
            _ => {}
        }
        Ok(())
    }

    /// Sample the most recent fix and run it through the filter.
    pub fn on_tick(&mut self) -> Result<TickOutcome> {
        if self.apply(&SessionEvent::Tick)? != SessionState::Recording {
            return Ok(TickOutcome::NoFix);
        }
        let fix = match self.latest_fix {
            Some(fix) => fix,
            None => return Ok(TickOutcome::NoFix),
        };

        let last = self.points.back().map(RecordedPoint::point);
        let decision = self.filter.evaluate(&fix, last.as_ref());
        if decision.is_accept() {
            self.accept(fix);
        } else {
            self.skips.record(decision);
        }
        Ok(TickOutcome::Evaluated(decision))
    }

    fn accept(&mut self, fix: GeoFix) {
        self.accumulator.push(fix.point());
        self.quality.record_accepted(fix.accuracy_meters);
        self.points.push_back(RecordedPoint {
            fix,
            sequence: self.quality.accepted() as u64,
        });

        if self.points.len() > self.config.max_recorded_points as usize {
            self.points.pop_front();
            if self.trimmed == 0 {
                warn!(
                    "[Session] Recording window full ({} points); dropping oldest points",
                    self.config.max_recorded_points
                );
            }
            self.trimmed += 1;
        }
    }

    /// Halt on a location provider failure. The error is returned verbatim.
    pub fn on_provider_error(&mut self, error: ProviderError) -> SurveyError {
        if let Err(err) = self.apply(&SessionEvent::ProviderError(error)) {
            return err;
        }
        self.latest_fix = None;
        warn!("[Session] Location provider failed: {}", error);
        SurveyError::Provider(error)
    }

    /// Stop recording and compute the result.
    ///
    /// Fails with `InsufficientPoints` when fewer than three points are
    /// retained; the session is stopped either way and must be discarded.
    pub fn stop(&mut self, measurement_index: u32) -> Result<MeasurementResult> {
        self.apply(&SessionEvent::Stop)?;
        self.latest_fix = None;

        let points: Vec<GpsPoint> = self.points.iter().map(RecordedPoint::point).collect();
        let polygon = self.closer.close(&points)?;
        let area = self.area_engine.compute(&polygon);
        let quality = self.quality.report(&self.skips);

        info!(
            "[Session] Stopped: {} accepted, {} skipped, area {:.2}m², perimeter {:.2}m",
            quality.accepted_count,
            quality.skipped_count,
            area.area_square_meters,
            area.perimeter_meters
        );

        Ok(MeasurementResult::new(
            &area,
            &polygon,
            &quality,
            self.trimmed,
            self.accumulator.total_meters(),
            measurement_index,
        ))
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SurveyConfig {
        &self.config
    }

    pub fn latest_fix(&self) -> Option<&GeoFix> {
        self.latest_fix.as_ref()
    }

    /// Accepted points still in the recording window.
    pub fn points(&self) -> impl Iterator<Item = &RecordedPoint> {
        self.points.iter()
    }

    pub fn retained_count(&self) -> usize {
        self.points.len()
    }

    /// Accepted fixes over the whole session.
    pub fn accepted_count(&self) -> u32 {
        self.quality.accepted()
    }

    pub fn skip_counter(&self) -> &SkipCounter {
        &self.skips
    }

    pub fn live_distance_meters(&self) -> f64 {
        self.accumulator.total_meters()
    }

    pub fn trimmed_count(&self) -> u32 {
        self.trimmed
    }
}
