use serde::{Deserialize, Serialize};

use crate::model::Symbol;

/// A single interference stimulus: the word printed and the colour it is printed in.
///
/// Both fields are drawn independently, so they agree in roughly a quarter of rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterferenceChallenge {
    pub label: Symbol,
    pub ink: Symbol,
}

impl InterferenceChallenge {
    #[must_use]
    pub fn new(label: Symbol, ink: Symbol) -> Self {
        Self { label, ink }
    }

    /// The only correct answer is the ink colour.
    #[must_use]
    pub fn is_answered_by(&self, symbol: Symbol) -> bool {
        self.ink == symbol
    }

    /// True when the label and ink agree (no interference this round).
    #[must_use]
    pub fn is_congruent(&self) -> bool {
        self.label == self.ink
    }
}
