use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("highlight duration must be > 0 ms")]
    InvalidHighlight,

    #[error("round ceiling must be > 0")]
    InvalidRoundCeiling,

    #[error("interference points must be > 0")]
    InvalidInterferencePoints,
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Timing and scoring knobs shared by both drill modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DrillSettingsDraft")]
pub struct DrillSettings {
    highlight_ms: u64,
    gap_ms: u64,
    round_pause_ms: u64,
    round_ceiling: u32,
    interference_points: u32,
}

impl DrillSettings {
    pub const DEFAULT_HIGHLIGHT_MS: u64 = 600;
    pub const DEFAULT_GAP_MS: u64 = 200;
    pub const DEFAULT_ROUND_PAUSE_MS: u64 = 1_000;
    pub const DEFAULT_ROUND_CEILING: u32 = 10;
    pub const DEFAULT_INTERFERENCE_POINTS: u32 = 10;

    /// How long each symbol stays lit during playback.
    #[must_use]
    pub fn highlight(&self) -> Duration {
        Duration::from_millis(self.highlight_ms)
    }

    /// Dark gap after each highlighted symbol.
    #[must_use]
    pub fn gap(&self) -> Duration {
        Duration::from_millis(self.gap_ms)
    }

    /// Pause between a completed sequence and the next playback.
    #[must_use]
    pub fn round_pause(&self) -> Duration {
        Duration::from_millis(self.round_pause_ms)
    }

    /// Number of correct interference rounds that ends the session.
    #[must_use]
    pub fn round_ceiling(&self) -> u32 {
        self.round_ceiling
    }

    /// Raw score awarded per correct interference round.
    #[must_use]
    pub fn interference_points(&self) -> u32 {
        self.interference_points
    }
}

impl Default for DrillSettings {
    fn default() -> Self {
        Self {
            highlight_ms: Self::DEFAULT_HIGHLIGHT_MS,
            gap_ms: Self::DEFAULT_GAP_MS,
            round_pause_ms: Self::DEFAULT_ROUND_PAUSE_MS,
            round_ceiling: Self::DEFAULT_ROUND_CEILING,
            interference_points: Self::DEFAULT_INTERFERENCE_POINTS,
        }
    }
}

/// Partially specified settings, as read from a config file or environment.
///
/// Missing fields fall back to the defaults on `validate`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DrillSettingsDraft {
    pub highlight_ms: Option<u64>,
    pub gap_ms: Option<u64>,
    pub round_pause_ms: Option<u64>,
    pub round_ceiling: Option<u32>,
    pub interference_points: Option<u32>,
}

impl DrillSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay `other` on top of `self`; fields set in `other` win.
    #[must_use]
    pub fn merge(self, other: DrillSettingsDraft) -> Self {
        Self {
            highlight_ms: other.highlight_ms.or(self.highlight_ms),
            gap_ms: other.gap_ms.or(self.gap_ms),
            round_pause_ms: other.round_pause_ms.or(self.round_pause_ms),
            round_ceiling: other.round_ceiling.or(self.round_ceiling),
            interference_points: other.interference_points.or(self.interference_points),
        }
    }

    /// Fill defaults and check invariants.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the highlight duration, round ceiling, or
    /// interference points are zero.
    pub fn validate(self) -> Result<DrillSettings, SettingsError> {
        let defaults = DrillSettings::default();
        let settings = DrillSettings {
            highlight_ms: self.highlight_ms.unwrap_or(defaults.highlight_ms),
            gap_ms: self.gap_ms.unwrap_or(defaults.gap_ms),
            round_pause_ms: self.round_pause_ms.unwrap_or(defaults.round_pause_ms),
            round_ceiling: self.round_ceiling.unwrap_or(defaults.round_ceiling),
            interference_points: self
                .interference_points
                .unwrap_or(defaults.interference_points),
        };

        if settings.highlight_ms == 0 {
            return Err(SettingsError::InvalidHighlight);
        }
        if settings.round_ceiling == 0 {
            return Err(SettingsError::InvalidRoundCeiling);
        }
        if settings.interference_points == 0 {
            return Err(SettingsError::InvalidInterferencePoints);
        }

        Ok(settings)
    }
}

impl TryFrom<DrillSettingsDraft> for DrillSettings {
    type Error = SettingsError;

    fn try_from(draft: DrillSettingsDraft) -> Result<Self, Self::Error> {
        draft.validate()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
