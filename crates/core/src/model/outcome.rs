use serde::{Deserialize, Serialize};

use crate::model::DrillMode;

/// Externally visible phase of a drill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DrillState {
    Idle,
    Presenting,
    AwaitingInput,
    Terminated,
}

impl DrillState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, DrillState::Terminated)
    }
}

/// Why a drill ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// The player gave a wrong answer.
    Mismatch,
    /// The interference round ceiling was reached.
    Complete,
    /// The host abandoned the drill.
    Aborted,
}

/// Result of feeding one input symbol to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    /// Input arrived out of phase and was dropped.
    Ignored,
    /// Correct so far; `remaining` more symbols complete the sequence.
    Progress { matched: usize, remaining: usize },
    /// A sequence or interference round was completed and the drill continues.
    RoundComplete { score: u32 },
    /// The drill ended with this input.
    Terminated(Outcome),
}

impl RoundOutcome {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, RoundOutcome::Terminated(_))
    }
}

/// Normalized result handed to the host once a drill has terminated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalResult {
    pub mode: DrillMode,
    pub outcome: Outcome,
    /// Normalized to `0..=100`.
    pub score: u8,
    pub rounds_completed: u32,
    pub feedback: String,
}

/// Maps a raw engine score onto the 0..=100 scale hosts display.
///
/// Sequence drills earn one raw point per replicated sequence, worth ten;
/// interference drills already accumulate in tens.
#[must_use]
pub fn normalize_score(mode: DrillMode, raw: u32) -> u8 {
    let scaled = match mode {
        DrillMode::Sequence => raw.saturating_mul(10),
        DrillMode::Interference => raw,
    };
    u8::try_from(scaled.min(100)).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_scores_scale_by_ten_and_cap() {
        assert_eq!(normalize_score(DrillMode::Sequence, 0), 0);
        assert_eq!(normalize_score(DrillMode::Sequence, 1), 10);
        assert_eq!(normalize_score(DrillMode::Sequence, 10), 100);
        assert_eq!(normalize_score(DrillMode::Sequence, 37), 100);
        assert_eq!(normalize_score(DrillMode::Sequence, u32::MAX), 100);
    }

    #[test]
    fn interference_scores_are_capped() {
        assert_eq!(normalize_score(DrillMode::Interference, 40), 40);
        assert_eq!(normalize_score(DrillMode::Interference, 100), 100);
        assert_eq!(normalize_score(DrillMode::Interference, 150), 100);
    }
}
