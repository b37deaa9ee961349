//! # Survey Controller
//!
//! Single owner of the active [`Session`] and of the results list.
//!
//! A fresh session is created on every start and dropped on stop, so no
//! points, counters or distances leak from one walk into the next. Completed
//! results are appended to the [`MeasurementAggregator`].

use log::info;

use crate::aggregator::{AverageOutcome, MeasurementAggregator};
use crate::error::{ProviderError, Result, SurveyError};
use crate::measurement::MeasurementResult;
use crate::session::{Session, SessionState, TickOutcome};
use crate::{GeoFix, SurveyConfig};

pub struct SurveyController {
    config: SurveyConfig,
    session: Option<Session>,
    aggregator: MeasurementAggregator,
}

impl Default for SurveyController {
    fn default() -> Self {
        Self::new(SurveyConfig::default())
    }
}

impl SurveyController {
    pub fn new(config: SurveyConfig) -> Self {
        Self {
            config,
            session: None,
            aggregator: MeasurementAggregator::new(),
        }
    }

    pub fn config(&self) -> &SurveyConfig {
        &self.config
    }

    /// Replace the configuration used by subsequent sessions.
    pub fn set_config(&mut self, config: SurveyConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Start a new measurement. Any session in progress is discarded.
    pub fn start(&mut self) -> Result<()> {
        self.config.validate()?;
        if let Some(previous) = self.session.take() {
            info!(
                "[SurveyController] Discarding session in state {:?} with {} points",
                previous.state(),
                previous.accepted_count()
            );
        }

        let mut session = Session::new(self.config.clone());
        session.start()?;
        self.session = Some(session);
        info!(
            "[SurveyController] Started measurement {}",
            self.aggregator.next_index()
        );
        Ok(())
    }

    fn active(&mut self) -> Result<&mut Session> {
        self.session.as_mut().ok_or(SurveyError::NoActiveSession)
    }

    pub fn push_fix(&mut self, fix: GeoFix) -> Result<()> {
        self.active()?.on_fix(fix)
    }

    pub fn tick(&mut self) -> Result<TickOutcome> {
        self.active()?.on_tick()
    }

    /// Abort the active session on a provider failure; returns the error.
    pub fn provider_error(&mut self, error: ProviderError) -> SurveyError {
        match self.session.take() {
            Some(mut session) => session.on_provider_error(error),
            None => SurveyError::NoActiveSession,
        }
    }

    /// Stop the active session and append its result.
    ///
    /// The session is discarded whether or not a result could be produced.
    pub fn stop(&mut self) -> Result<MeasurementResult> {
        let mut session = self.session.take().ok_or(SurveyError::NoActiveSession)?;
        let result = session.stop(self.aggregator.next_index())?;
        self.aggregator.push(result.clone());
        Ok(result)
    }

    /// Append a result produced outside the controller (e.g. by the async
    /// recorder), assigning it the next index.
    pub fn add_result(&mut self, result: MeasurementResult) -> MeasurementResult {
        let result = result.with_index(self.aggregator.next_index());
        self.aggregator.push(result.clone());
        result
    }

    pub fn state(&self) -> SessionState {
        self.session
            .as_ref()
            .map(Session::state)
            .unwrap_or(SessionState::Idle)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Live running distance of the active session.
    pub fn live_distance_meters(&self) -> Option<f64> {
        self.session.as_ref().map(Session::live_distance_meters)
    }

    pub fn results(&self) -> &[MeasurementResult] {
        self.aggregator.results()
    }

    pub fn aggregator(&self) -> &MeasurementAggregator {
        &self.aggregator
    }

    pub fn compute_average(&self) -> AverageOutcome {
        self.aggregator.compute_average()
    }

    pub fn clear_results(&mut self) {
        self.aggregator.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: [(f64, f64); 4] = [
        (0.0, 0.0),
        (0.0, 0.0009044),
        (0.0009044, 0.0009044),
        (0.0009044, 0.0),
    ];

    fn walk(controller: &mut SurveyController, corners: &[(f64, f64)]) {
        for (i, (lat, lng)) in corners.iter().enumerate() {
            controller
                .push_fix(GeoFix::new(*lat, *lng, 3.0, i as i64 * 1000))
                .unwrap();
            controller.tick().unwrap();
        }
    }

    #[test]
    fn test_requires_active_session() {
        let mut controller = SurveyController::default();
        assert_eq!(controller.tick(), Err(SurveyError::NoActiveSession));
        assert_eq!(controller.stop().unwrap_err(), SurveyError::NoActiveSession);
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[test]
    fn test_two_walks_average() {
        let mut controller = SurveyController::default();
        controller.start().unwrap();
        walk(&mut controller, &SQUARE);
        let first = controller.stop().unwrap();
        assert_eq!(first.measurement_index, 1);
        assert!(controller.compute_average().available().is_none());

        controller.start().unwrap();
        walk(&mut controller, &SQUARE);
        let second = controller.stop().unwrap();
        assert_eq!(second.measurement_index, 2);

        let avg = controller.compute_average().available().unwrap();
        assert_eq!(avg.measurement_count, 2);
        assert_eq!(avg.average_area_square_meters, first.area_square_meters);
    }

    #[test]
    fn test_sessions_do_not_share_state() {
        let mut controller = SurveyController::default();
        controller.start().unwrap();
        walk(&mut controller, &SQUARE[..2]);
        assert!(controller.live_distance_meters().unwrap() > 0.0);

        controller.start().unwrap();
        assert_eq!(controller.live_distance_meters(), Some(0.0));
        assert_eq!(controller.state(), SessionState::AwaitingFirstFix);
        assert_eq!(controller.session().unwrap().accepted_count(), 0);
    }

    #[test]
    fn test_failed_stop_discards_session() {
        let mut controller = SurveyController::default();
        controller.start().unwrap();
        walk(&mut controller, &SQUARE[..2]);
        assert!(matches!(
            controller.stop(),
            Err(SurveyError::InsufficientPoints { point_count: 2, .. })
        ));
        assert!(controller.session().is_none());
        assert!(controller.results().is_empty());
    }

    #[test]
    fn test_provider_error_discards_session() {
        let mut controller = SurveyController::default();
        controller.start().unwrap();
        walk(&mut controller, &SQUARE);
        let err = controller.provider_error(ProviderError::PositionUnavailable);
        assert_eq!(err, SurveyError::Provider(ProviderError::PositionUnavailable));
        assert!(controller.session().is_none());
        assert!(controller.results().is_empty());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut controller = SurveyController::default();
        let bad = SurveyConfig {
            tick_interval_ms: 0,
            ..SurveyConfig::default()
        };
        assert!(controller.set_config(bad).is_err());
        assert_eq!(controller.config().tick_interval_ms, 1000);
    }
}
