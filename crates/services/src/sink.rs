use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use drill_core::model::{PatientId, SessionResult};

use crate::error::SinkError;

/// Destination for finished drill records, implemented by the host.
#[async_trait]
pub trait DrillResultSink: Send + Sync {
    /// Store one session-history record.
    ///
    /// # Errors
    ///
    /// Returns `SinkError` if the record cannot be stored; the caller may retry.
    async fn append_result(&self, record: &SessionResult) -> Result<(), SinkError>;
}

/// Simple in-memory sink for tests and demos.
#[derive(Clone, Default)]
pub struct InMemoryResultSink {
    records: Arc<Mutex<Vec<SessionResult>>>,
}

impl InMemoryResultSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All records in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `SinkError::Unavailable` if the store lock is poisoned.
    pub fn records(&self) -> Result<Vec<SessionResult>, SinkError> {
        let guard = self
            .records
            .lock()
            .map_err(|e| SinkError::Unavailable(e.to_string()))?;
        Ok(guard.clone())
    }

    /// History for one patient, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SinkError::Unavailable` if the store lock is poisoned.
    pub fn history_for(&self, patient_id: PatientId) -> Result<Vec<SessionResult>, SinkError> {
        let mut history: Vec<_> = self
            .records()?
            .into_iter()
            .filter(|r| r.patient_id == patient_id)
            .collect();
        history.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        Ok(history)
    }

    /// Rounded mean score across a patient's history, `None` when empty.
    ///
    /// # Errors
    ///
    /// Returns `SinkError::Unavailable` if the store lock is poisoned.
    pub fn average_score(&self, patient_id: PatientId) -> Result<Option<u8>, SinkError> {
        let history = self.history_for(patient_id)?;
        if history.is_empty() {
            return Ok(None);
        }
        let total: u64 = history.iter().map(|r| u64::from(r.score)).sum();
        let count = history.len() as u64;
        let mean = (total * 2 + count) / (count * 2);
        Ok(Some(u8::try_from(mean).unwrap_or(u8::MAX)))
    }
}

#[async_trait]
impl DrillResultSink for InMemoryResultSink {
    async fn append_result(&self, record: &SessionResult) -> Result<(), SinkError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|e| SinkError::Unavailable(e.to_string()))?;
        guard.push(record.clone());
        Ok(())
    }
}
