use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown drill mode: {0:?}")]
pub struct ParseModeError(String);

/// Which drill a session runs. Fixed for the lifetime of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DrillMode {
    /// Replicate an ever-growing symbol sequence.
    Sequence,
    /// Name the ink colour while ignoring a conflicting label.
    Interference,
}

impl DrillMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DrillMode::Sequence => "sequence",
            DrillMode::Interference => "interference",
        }
    }
}

impl fmt::Display for DrillMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DrillMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequence" | "seq" => Ok(DrillMode::Sequence),
            "interference" | "stroop" => Ok(DrillMode::Interference),
            other => Err(ParseModeError(other.to_owned())),
        }
    }
}

/// Therapy category a history record is filed under.
///
/// Drills always report as `Brain`; the other variants exist so records from
/// the host's other therapy flows share one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TherapyType {
    Body,
    Brain,
    Speech,
    Mental,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_aliases() {
        assert_eq!("Sequence".parse::<DrillMode>().unwrap(), DrillMode::Sequence);
        assert_eq!("stroop".parse::<DrillMode>().unwrap(), DrillMode::Interference);
        assert!("memory".parse::<DrillMode>().is_err());
    }

    #[test]
    fn serializes_in_upper_case() {
        let json = serde_json::to_string(&TherapyType::Brain).unwrap();
        assert_eq!(json, "\"BRAIN\"");
        let json = serde_json::to_string(&DrillMode::Interference).unwrap();
        assert_eq!(json, "\"INTERFERENCE\"");
    }
}
