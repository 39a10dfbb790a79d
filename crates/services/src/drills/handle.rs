use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use drill_core::model::{
    DrillId, DrillMode, DrillState, FinalResult, InterferenceChallenge, PatientId, RoundOutcome,
    SessionResult, Symbol,
};
use drill_core::time::offset;
use drill_core::{Clock, DrillEngine, PlaybackTicket};

use crate::error::DrillServiceError;
use crate::observer::{CueEvent, CueKind, DrillObserver};
use crate::sink::DrillResultSink;

/// How a call to [`DrillHandle::advance_presentation`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    /// Playback ran to the end and input is now open.
    Finished,
    /// The drill was aborted mid-playback.
    Cancelled,
    /// Another caller already played, or is playing, this presentation.
    Stale,
    /// The drill was not presenting.
    Idle,
}

/// Point-in-time view of a drill for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrillSnapshot {
    pub drill_id: DrillId,
    pub mode: DrillMode,
    pub state: DrillState,
    pub score: u32,
    pub level: usize,
    pub round_count: u32,
    pub sequence: Vec<Symbol>,
    pub progress: Vec<Symbol>,
    pub challenge: Option<InterferenceChallenge>,
}

struct Ledger {
    engine: DrillEngine,
    report: Option<SessionResult>,
    /// Presentation currently being played by some caller.
    in_flight: Option<PlaybackTicket>,
}

/// Holds the playback claim for one ticket; released on drop so an abandoned
/// playback future does not block a later replay.
struct PlaybackClaim<'a> {
    handle: &'a DrillHandle,
    ticket: PlaybackTicket,
}

impl Drop for PlaybackClaim<'_> {
    fn drop(&mut self) {
        if let Ok(mut ledger) = self.handle.shared.ledger.lock() {
            if ledger.in_flight == Some(self.ticket) {
                ledger.in_flight = None;
            }
        }
    }
}

struct Shared {
    drill_id: DrillId,
    patient_id: PatientId,
    clock: Clock,
    ledger: Mutex<Ledger>,
    persisted: tokio::sync::Mutex<bool>,
    cancel: CancellationToken,
    observer: Arc<dyn DrillObserver>,
    sink: Arc<dyn DrillResultSink>,
}

/// Shared handle to one running drill.
///
/// Clones refer to the same session, so one task can sit in
/// `advance_presentation` while another calls `abort`.
#[derive(Clone)]
pub struct DrillHandle {
    shared: Arc<Shared>,
}

impl DrillHandle {
    pub(crate) fn new(
        engine: DrillEngine,
        patient_id: PatientId,
        clock: Clock,
        observer: Arc<dyn DrillObserver>,
        sink: Arc<dyn DrillResultSink>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                drill_id: DrillId::random(),
                patient_id,
                clock,
                ledger: Mutex::new(Ledger {
                    engine,
                    report: None,
                    in_flight: None,
                }),
                persisted: tokio::sync::Mutex::new(false),
                cancel: CancellationToken::new(),
                observer,
                sink,
            }),
        }
    }

    fn ledger(&self) -> Result<MutexGuard<'_, Ledger>, DrillServiceError> {
        self.shared
            .ledger
            .lock()
            .map_err(|_| DrillServiceError::Poisoned)
    }

    #[must_use]
    pub fn drill_id(&self) -> DrillId {
        self.shared.drill_id
    }

    #[must_use]
    pub fn patient_id(&self) -> PatientId {
        self.shared.patient_id
    }

    /// # Errors
    ///
    /// Returns `DrillServiceError::Poisoned` if the engine lock is poisoned.
    pub fn state(&self) -> Result<DrillState, DrillServiceError> {
        Ok(self.ledger()?.engine.state())
    }

    /// # Errors
    ///
    /// Returns `DrillServiceError::Poisoned` if the engine lock is poisoned.
    pub fn snapshot(&self) -> Result<DrillSnapshot, DrillServiceError> {
        let ledger = self.ledger()?;
        let engine = &ledger.engine;
        Ok(DrillSnapshot {
            drill_id: self.shared.drill_id,
            mode: engine.mode(),
            state: engine.state(),
            score: engine.score(),
            level: engine.level(),
            round_count: engine.round_count(),
            sequence: engine.sequence().to_vec(),
            progress: engine.progress().to_vec(),
            challenge: engine.challenge(),
        })
    }

    /// Normalized result, once the drill has terminated.
    ///
    /// # Errors
    ///
    /// Returns `DrillServiceError::Poisoned` if the engine lock is poisoned.
    pub fn final_result(&self) -> Result<Option<FinalResult>, DrillServiceError> {
        Ok(self.ledger()?.engine.final_result())
    }

    /// The history record built at termination, if any.
    ///
    /// # Errors
    ///
    /// Returns `DrillServiceError::Poisoned` if the engine lock is poisoned.
    pub fn report(&self) -> Result<Option<SessionResult>, DrillServiceError> {
        Ok(self.ledger()?.report.clone())
    }

    /// Play the pending sequence presentation, then open input.
    ///
    /// Each symbol is shown for the highlight duration and followed by the
    /// gap; the observer receives a `Shown` and a `Hidden` cue per symbol.
    /// Abort interrupts the wait at the next suspension point.
    ///
    /// Only one caller plays a given presentation; a concurrent call for the
    /// same one returns `Stale` without emitting cues.
    ///
    /// # Errors
    ///
    /// Returns `DrillServiceError::Poisoned` if the engine lock is poisoned.
    pub async fn advance_presentation(&self) -> Result<PlaybackStatus, DrillServiceError> {
        let playback = {
            let mut ledger = self.ledger()?;
            let Some(playback) = ledger.engine.presentation() else {
                return Ok(PlaybackStatus::Idle);
            };
            if ledger.in_flight == Some(playback.ticket) {
                return Ok(PlaybackStatus::Stale);
            }
            ledger.in_flight = Some(playback.ticket);
            playback
        };
        let _claim = PlaybackClaim {
            handle: self,
            ticket: playback.ticket,
        };

        let drill_id = self.shared.drill_id;
        let started = self.shared.clock.now();
        debug!(%drill_id, cues = playback.cues.len(), "playback started");

        if !self.pause(playback.lead_in).await {
            return Ok(PlaybackStatus::Cancelled);
        }

        for cue in &playback.cues {
            let shown = CueEvent::new(drill_id, cue, CueKind::Shown, offset(started, cue.starts_at));
            self.shared.observer.on_cue(&shown);
            if !self.pause(cue.ends_at.saturating_sub(cue.starts_at)).await {
                return Ok(PlaybackStatus::Cancelled);
            }

            let hidden = CueEvent::new(drill_id, cue, CueKind::Hidden, offset(started, cue.ends_at));
            self.shared.observer.on_cue(&hidden);
            if !self.pause(playback.gap).await {
                return Ok(PlaybackStatus::Cancelled);
            }
        }

        let (finished, terminated) = {
            let mut ledger = self.ledger()?;
            let finished = ledger.engine.finish_presentation(playback.ticket);
            (finished, ledger.engine.state().is_terminal())
        };
        if finished {
            debug!(%drill_id, "playback finished, awaiting input");
            Ok(PlaybackStatus::Finished)
        } else if terminated {
            Ok(PlaybackStatus::Cancelled)
        } else {
            Ok(PlaybackStatus::Stale)
        }
    }

    /// Sleep for `duration` unless the drill is cancelled first.
    async fn pause(&self, duration: Duration) -> bool {
        if duration.is_zero() {
            return !self.shared.cancel.is_cancelled();
        }
        tokio::select! {
            biased;
            () = self.shared.cancel.cancelled() => false,
            () = tokio::time::sleep(duration) => true,
        }
    }

    /// Submit one player input.
    ///
    /// When the input ends the drill, the completion callback fires and the
    /// history record is sent to the sink before this returns.
    ///
    /// # Errors
    ///
    /// Returns `DrillServiceError::Sink` if the final record could not be
    /// stored. The drill itself stays terminated: read the outcome through
    /// [`DrillHandle::final_result`] and retry the append with
    /// `DrillLoopService::finalize_report`.
    pub async fn submit(&self, symbol: Symbol) -> Result<RoundOutcome, DrillServiceError> {
        let outcome = self.ledger()?.engine.submit_input(symbol);
        let drill_id = self.shared.drill_id;

        if outcome.is_terminal() {
            self.settle().await?;
            return Ok(outcome);
        }
        match outcome {
            RoundOutcome::Ignored => debug!(%drill_id, %symbol, "dropped out-of-phase input"),
            RoundOutcome::Progress { matched, remaining } => {
                debug!(%drill_id, matched, remaining, "input accepted");
            }
            RoundOutcome::RoundComplete { score } => debug!(%drill_id, score, "round complete"),
            RoundOutcome::Terminated(_) => {}
        }
        Ok(outcome)
    }

    /// Abort the drill with a zero score, cancelling any pending playback timer.
    ///
    /// # Errors
    ///
    /// Returns `DrillServiceError::Sink` if the final record could not be stored.
    /// The abort has still taken effect; [`DrillHandle::final_result`] returns
    /// the aborted result.
    pub async fn abort(&self) -> Result<FinalResult, DrillServiceError> {
        self.shared.cancel.cancel();
        let result = self.ledger()?.engine.abort();
        self.settle().await?;
        Ok(result)
    }

    /// Build the report, notify the observer once, and persist the report.
    pub(crate) async fn settle(&self) -> Result<SessionResult, DrillServiceError> {
        let (report, first_settle) = {
            let mut ledger = self.ledger()?;
            let Some(result) = ledger.engine.final_result() else {
                return Err(DrillServiceError::NotTerminated);
            };
            match &ledger.report {
                Some(report) => (report.clone(), None),
                None => {
                    let report = SessionResult::from_final(
                        self.shared.drill_id,
                        self.shared.patient_id,
                        self.shared.clock.now(),
                        &result,
                    );
                    ledger.report = Some(report.clone());
                    (report, Some(result))
                }
            }
        };

        if let Some(result) = first_settle {
            self.shared.cancel.cancel();
            info!(
                drill_id = %self.shared.drill_id,
                mode = %result.mode,
                outcome = ?result.outcome,
                score = result.score,
                "drill terminated"
            );
            self.shared.observer.on_complete(&result);
        }

        self.persist(&report).await?;
        Ok(report)
    }

    async fn persist(&self, report: &SessionResult) -> Result<(), DrillServiceError> {
        let mut persisted = self.shared.persisted.lock().await;
        if *persisted {
            return Ok(());
        }
        match self.shared.sink.append_result(report).await {
            Ok(()) => {
                *persisted = true;
                Ok(())
            }
            Err(err) => {
                warn!(drill_id = %self.shared.drill_id, error = %err, "failed to store drill result");
                Err(err.into())
            }
        }
    }
}

impl fmt::Debug for DrillHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrillHandle")
            .field("drill_id", &self.shared.drill_id)
            .field("patient_id", &self.shared.patient_id)
            .field("cancelled", &self.shared.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}
