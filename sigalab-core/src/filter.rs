use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::record::ExamRecord;

/// Search criteria of the exam list. Empty text and missing dates match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ExamFilters {
    pub exam_name: String,
    pub laboratory: String,
    pub requesting_doctor: String,
    #[serde(deserialize_with = "blank_or_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(deserialize_with = "blank_or_date")]
    pub end_date: Option<NaiveDate>,
}

impl ExamFilters {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Case-insensitive substring match on the text fields, inclusive date bounds.
    pub fn matches(&self, record: &ExamRecord) -> bool {
        contains_folded(&record.exam_name, &self.exam_name)
            && contains_folded(&record.laboratory, &self.laboratory)
            && contains_folded(&record.requesting_doctor, &self.requesting_doctor)
            && self.start_date.map_or(true, |start| record.date >= start)
            && self.end_date.map_or(true, |end| record.date <= end)
    }

    pub fn apply<'a>(&self, records: &'a [ExamRecord]) -> Vec<&'a ExamRecord> {
        records.iter().filter(|record| self.matches(record)).collect()
    }
}

// Date inputs post "" when cleared.
fn blank_or_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}
