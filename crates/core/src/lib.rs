//! Drill engine for the cognitive "brain games" therapy flows.
//!
//! The crate is pure: no I/O, no timers, no logging. Hosts inject randomness
//! through [`source::SymbolSource`] and drive playback timing themselves.

#![forbid(unsafe_code)]

pub mod engine;
pub mod error;
pub mod model;
pub mod source;
pub mod time;

pub use engine::{DrillEngine, Playback, PlaybackTicket, PresentationCue};
pub use error::Error;
pub use source::{ScriptedSource, SeededSource, SymbolSource};
pub use time::Clock;
