//! In-memory store of exam records with JSON import/export.

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{TrackerError, TrackerResult};
use crate::record::{ExamDraft, ExamRecord};

/// All records known to the application, in insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ExamLedger {
    records: Vec<ExamRecord>,
}

impl ExamLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<ExamRecord>) -> Self {
        Self { records }
    }

    /// Load a JSON array of records. Blank input is an empty ledger.
    pub fn from_json_str(raw: &str) -> TrackerResult<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(raw).map_err(|err| TrackerError::Parse(err.to_string()))
    }

    pub fn to_json_string(&self) -> TrackerResult<String> {
        serde_json::to_string_pretty(self).map_err(|err| TrackerError::Parse(err.to_string()))
    }

    pub fn records(&self) -> &[ExamRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records of one user, in insertion order.
    pub fn owned_by(&self, owner_id: &str) -> Vec<ExamRecord> {
        self.records
            .iter()
            .filter(|record| record.owner_id == owner_id)
            .cloned()
            .collect()
    }

    /// Store a draft for `owner_id` under a fresh id.
    pub fn add(&mut self, owner_id: &str, draft: ExamDraft) -> TrackerResult<&ExamRecord> {
        if owner_id.trim().is_empty() {
            return Err(TrackerError::MissingData);
        }
        if draft.exam_name.trim().is_empty() {
            return Err(TrackerError::Validation(
                "exam name must not be empty".to_string(),
            ));
        }
        if !draft.value.is_finite() {
            return Err(TrackerError::Validation(format!(
                "result of {} is not a number",
                draft.exam_name
            )));
        }

        let record = draft.into_record(Uuid::new_v4().to_string(), owner_id.to_string());
        info!(id = %record.id, exam = %record.exam_name, "exam recorded");
        self.records.push(record);
        Ok(&self.records[self.records.len() - 1])
    }

    /// Remove one record. Records of other users are never touched.
    pub fn delete(&mut self, owner_id: &str, id: &str) -> TrackerResult<ExamRecord> {
        let position = self
            .records
            .iter()
            .position(|record| record.id == id && record.owner_id == owner_id)
            .ok_or_else(|| TrackerError::NotFound(format!("exam {id}")))?;
        let removed = self.records.remove(position);
        info!(id = %removed.id, exam = %removed.exam_name, "exam deleted");
        Ok(removed)
    }
}
