//! # Session Recorder
//!
//! Drives a [`Session`] from an asynchronous, push-based location source and
//! a fixed-period tick timer.
//!
//! The recorder task owns the session. It reacts to three inputs, in priority
//! order: the stop signal, a fix or error from the location source, and the
//! tick timer. [`RecorderHandle::stop`] signals the task and waits for it to
//! finish; the task unsubscribes from the source and drops the timer before
//! handing the session back, so no fix can be appended once `stop` returns.

use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::error::{ProviderError, Result, SurveyError};
use crate::filter::FilterDecision;
use crate::measurement::MeasurementResult;
use crate::session::{Session, SessionState, TickOutcome};
use crate::{GeoFix, SurveyConfig};

/// Item delivered by the location collaborator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationEvent {
    Fix(GeoFix),
    /// Terminal failure; the source delivers nothing afterwards
    Error(ProviderError),
}

/// Push-based source of location events.
pub trait LocationSource: Send {
    /// Begin delivery. Called once per recording.
    fn subscribe(&mut self) -> mpsc::Receiver<LocationEvent>;

    /// Stop delivery. Called once when recording ends.
    fn unsubscribe(&mut self);
}

/// Location source fed through a tokio channel.
pub struct ChannelLocationSource {
    receiver: Option<mpsc::Receiver<LocationEvent>>,
    subscribed: bool,
}

impl ChannelLocationSource {
    /// Create a source and the sender that feeds it.
    pub fn new(capacity: usize) -> (Self, mpsc::Sender<LocationEvent>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (
            Self {
                receiver: Some(receiver),
                subscribed: false,
            },
            sender,
        )
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }
}

impl LocationSource for ChannelLocationSource {
    fn subscribe(&mut self) -> mpsc::Receiver<LocationEvent> {
        self.subscribed = true;
        match self.receiver.take() {
            Some(receiver) => receiver,
            None => {
                // Already consumed by an earlier recording: hand out a closed stream
                let (_, receiver) = mpsc::channel(1);
                receiver
            }
        }
    }

    fn unsubscribe(&mut self) {
        self.subscribed = false;
    }
}

/// Live feedback published after every handled event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecordingProgress {
    pub state: SessionState,
    pub accepted_count: u32,
    pub skipped_count: u32,
    pub live_distance_meters: f64,
    pub last_decision: Option<FilterDecision>,
}

impl RecordingProgress {
    fn of(session: &Session, last_decision: Option<FilterDecision>) -> Self {
        Self {
            state: session.state(),
            accepted_count: session.accepted_count(),
            skipped_count: session.skip_counter().total(),
            live_distance_meters: session.live_distance_meters(),
            last_decision,
        }
    }
}

/// Spawns recording tasks.
pub struct SessionRecorder;

impl SessionRecorder {
    /// Start recording on the current tokio runtime, ticking every
    /// `config.tick_interval_ms`. Fails with `Internal` outside a runtime.
    pub fn start<S>(config: SurveyConfig, source: S) -> Result<RecorderHandle>
    where
        S: LocationSource + 'static,
    {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|e| SurveyError::Internal {
            message: format!("recorder needs a tokio runtime: {}", e),
        })?;
        let period = Duration::from_millis(config.tick_interval_ms);

        let mut session = Session::new(config);
        session.start()?;

        let (stop_tx, stop_rx) = oneshot::channel();
        let (progress_tx, progress_rx) = watch::channel(RecordingProgress::of(&session, None));

        info!("[Recorder] Started, tick every {}ms", period.as_millis());
        let task = runtime.spawn(record(session, source, stop_rx, period, progress_tx));

        Ok(RecorderHandle {
            stop_tx: Some(stop_tx),
            task,
            progress: progress_rx,
        })
    }
}

/// Outcome of a finished recording task.
struct Finished {
    session: Session,
    failure: Option<ProviderError>,
}

async fn record<S: LocationSource>(
    mut session: Session,
    mut source: S,
    mut stop_rx: oneshot::Receiver<()>,
    period: Duration,
    progress: watch::Sender<RecordingProgress>,
) -> Finished {
    let mut fixes = source.subscribe();
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut stream_open = true;
    let mut failure = None;

    loop {
        tokio::select! {
            biased;

            // Explicit stop, or the handle was dropped
            _ = &mut stop_rx => break,

            event = fixes.recv(), if stream_open => match event {
                Some(LocationEvent::Fix(fix)) => {
                    if session.on_fix(fix).is_err() {
                        break;
                    }
                    progress.send_replace(RecordingProgress::of(&session, None));
                }
                Some(LocationEvent::Error(error)) => {
                    session.on_provider_error(error);
                    failure = Some(error);
                    progress.send_replace(RecordingProgress::of(&session, None));
                    break;
                }
                None => {
                    // Source went away without an error; keep ticking on the last fix
                    warn!("[Recorder] Location stream closed");
                    stream_open = false;
                }
            },

            _ = ticker.tick() => match session.on_tick() {
                Ok(TickOutcome::Evaluated(decision)) => {
                    progress.send_replace(RecordingProgress::of(&session, Some(decision)));
                }
                Ok(TickOutcome::NoFix) => {}
                Err(_) => break,
            },
        }
    }

    drop(fixes);
    drop(ticker);
    source.unsubscribe();

    Finished { session, failure }
}

/// Handle to a running recording.
pub struct RecorderHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<Finished>,
    progress: watch::Receiver<RecordingProgress>,
}

impl RecorderHandle {
    /// Latest live feedback.
    pub fn progress(&self) -> RecordingProgress {
        *self.progress.borrow()
    }

    /// Receiver for awaiting progress changes.
    pub fn subscribe_progress(&self) -> watch::Receiver<RecordingProgress> {
        self.progress.clone()
    }

    /// True once the task has ended (stopped or provider failure).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop recording and compute the result.
    ///
    /// Returns the provider error verbatim if the source failed during the
    /// recording, and `InsufficientPoints` if too few fixes were accepted.
    pub async fn stop(mut self, measurement_index: u32) -> Result<MeasurementResult> {
        if let Some(stop_tx) = self.stop_tx.take() {
            // The task may already have ended on a provider error
            let _ = stop_tx.send(());
        }

        let Finished {
            mut session,
            failure,
        } = self.task.await.map_err(|e| SurveyError::Internal {
            message: format!("recorder task failed: {}", e),
        })?;

        if let Some(error) = failure {
            return Err(SurveyError::Provider(error));
        }
        session.stop(measurement_index)
    }
}
