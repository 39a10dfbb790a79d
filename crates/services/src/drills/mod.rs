mod handle;
mod workflow;

// Public API of the drill subsystem.
pub use crate::error::DrillServiceError;
pub use handle::{DrillHandle, DrillSnapshot, PlaybackStatus};
pub use workflow::DrillLoopService;
