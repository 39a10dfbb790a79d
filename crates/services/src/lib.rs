#![forbid(unsafe_code)]

pub mod drills;
pub mod error;
pub mod observer;
pub mod sink;

pub use drill_core::Clock;

pub use drills::{DrillHandle, DrillLoopService, DrillSnapshot, PlaybackStatus};
pub use error::{DrillServiceError, SinkError};
pub use observer::{CueEvent, CueKind, DrillObserver, NoopObserver};
pub use sink::{DrillResultSink, InMemoryResultSink};
