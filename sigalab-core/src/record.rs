//! Exam records as stored by the application.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One laboratory result belonging to a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExamRecord {
    pub id: String,
    /// Older browser exports call this field `userId`.
    #[serde(alias = "userId")]
    pub owner_id: String,
    pub exam_name: String,
    #[serde(default)]
    pub sigtap_code: String,
    pub value: f64,
    #[serde(default)]
    pub reference_range: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub laboratory: String,
    #[serde(default)]
    pub requesting_doctor: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Everything the user supplies for a new record; id and owner are assigned on insertion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExamDraft {
    pub exam_name: String,
    #[serde(default)]
    pub sigtap_code: String,
    pub value: f64,
    #[serde(default)]
    pub reference_range: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub laboratory: String,
    #[serde(default)]
    pub requesting_doctor: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ExamDraft {
    /// Attach identity to the draft.
    pub fn into_record(self, id: String, owner_id: String) -> ExamRecord {
        ExamRecord {
            id,
            owner_id,
            exam_name: self.exam_name,
            sigtap_code: self.sigtap_code,
            value: self.value,
            reference_range: self.reference_range,
            unit: self.unit,
            laboratory: self.laboratory,
            requesting_doctor: self.requesting_doctor,
            date: self.date,
            notes: self.notes.filter(|text| !text.trim().is_empty()),
        }
    }
}
