use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{DrillId, DrillMode, FinalResult, Outcome, PatientId, TherapyType};

/// Session-history entry the host stores once a drill has terminated.
///
/// Field names follow the history table the dashboard reads from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResult {
    pub drill_id: DrillId,
    pub patient_id: PatientId,
    #[serde(rename = "timestamp")]
    pub recorded_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub therapy: TherapyType,
    pub mode: DrillMode,
    pub outcome: Outcome,
    pub score: u8,
    pub feedback: String,
}

impl SessionResult {
    /// Build a history entry for a finished brain drill.
    #[must_use]
    pub fn from_final(
        drill_id: DrillId,
        patient_id: PatientId,
        recorded_at: DateTime<Utc>,
        result: &FinalResult,
    ) -> Self {
        Self {
            drill_id,
            patient_id,
            recorded_at,
            therapy: TherapyType::Brain,
            mode: result.mode,
            outcome: result.outcome,
            score: result.score,
            feedback: result.feedback.clone(),
        }
    }
}
