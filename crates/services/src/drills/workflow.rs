use std::sync::Arc;

use tracing::info;

use drill_core::model::{DrillMode, DrillSettings, PatientId, SessionResult};
use drill_core::{DrillEngine, SymbolSource};

use super::handle::DrillHandle;
use crate::Clock;
use crate::error::DrillServiceError;
use crate::observer::{DrillObserver, NoopObserver};
use crate::sink::DrillResultSink;

/// Starts drills for one patient and routes their results to the host.
#[derive(Clone)]
pub struct DrillLoopService {
    clock: Clock,
    settings: DrillSettings,
    patient_id: PatientId,
    observer: Arc<dyn DrillObserver>,
    sink: Arc<dyn DrillResultSink>,
}

impl DrillLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        settings: DrillSettings,
        patient_id: PatientId,
        sink: Arc<dyn DrillResultSink>,
    ) -> Self {
        Self {
            clock,
            settings,
            patient_id,
            observer: Arc::new(NoopObserver),
            sink,
        }
    }

    /// Route presentation cues and completion callbacks to `observer`.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn DrillObserver>) -> Self {
        self.observer = observer;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &DrillSettings {
        &self.settings
    }

    #[must_use]
    pub fn patient_id(&self) -> PatientId {
        self.patient_id
    }

    /// Start a new drill. Sequence drills come back presenting, interference
    /// drills come back awaiting input.
    #[must_use]
    pub fn start_session(
        &self,
        mode: DrillMode,
        source: impl SymbolSource + 'static,
    ) -> DrillHandle {
        let engine = DrillEngine::start_session(mode, self.settings, source);
        let handle = DrillHandle::new(
            engine,
            self.patient_id,
            self.clock,
            Arc::clone(&self.observer),
            Arc::clone(&self.sink),
        );
        info!(
            drill_id = %handle.drill_id(),
            patient_id = %self.patient_id,
            %mode,
            "drill started"
        );
        handle
    }

    /// Retry storing the history record of a terminated drill.
    ///
    /// This is useful when the final append failed (e.g. the sink was briefly
    /// unavailable). Once stored, further calls return the record without
    /// appending it again.
    ///
    /// # Errors
    ///
    /// Returns `DrillServiceError::NotTerminated` if the drill is still running.
    /// Returns `DrillServiceError::Sink` if the sink fails again.
    pub async fn finalize_report(
        &self,
        handle: &DrillHandle,
    ) -> Result<SessionResult, DrillServiceError> {
        handle.settle().await
    }
}
