use chrono::{DateTime, Utc};

use drill_core::PresentationCue;
use drill_core::model::{DrillId, FinalResult, Symbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueKind {
    /// The symbol lights up.
    Shown,
    /// The symbol goes dark again.
    Hidden,
}

/// Presentation cue delivered to the host for rendering highlight state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueEvent {
    pub drill_id: DrillId,
    pub index: usize,
    pub symbol: Symbol,
    pub kind: CueKind,
    pub at: DateTime<Utc>,
}

impl CueEvent {
    pub(crate) fn new(
        drill_id: DrillId,
        cue: &PresentationCue,
        kind: CueKind,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            drill_id,
            index: cue.index,
            symbol: cue.symbol,
            kind,
            at,
        }
    }
}

/// Host callbacks for a running drill.
///
/// Callbacks run on the task driving the drill and must not block.
pub trait DrillObserver: Send + Sync {
    fn on_cue(&self, _event: &CueEvent) {}

    /// Called exactly once, when the drill terminates.
    fn on_complete(&self, _result: &FinalResult) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl DrillObserver for NoopObserver {}
