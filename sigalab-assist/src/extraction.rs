//! Document extraction: "given a lab report, list the exams it contains".
//!
//! The service fills fields on a best-effort basis. Each field has a fixed
//! fallback so an incomplete reply still yields usable drafts.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sigalab_core::classify::extract_numbers;
use sigalab_core::{ExamDraft, TrackerError, NOT_INFORMED};
use tracing::{debug, warn};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];

/// One exam read from a document, with every fallback already applied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedExam {
    pub exam_name: String,
    pub sigtap_code: String,
    /// `0.0` when the document had no readable value.
    pub value: f64,
    /// [`NOT_INFORMED`] when the document had no range.
    pub reference_range: String,
    pub unit: Option<String>,
    pub laboratory: String,
    pub requesting_doctor: String,
    pub date: NaiveDate,
    /// Set when `date` is the caller's fallback rather than a date from the document.
    pub date_assumed: bool,
    pub notes: Option<String>,
}

impl ExtractedExam {
    pub fn into_draft(self) -> ExamDraft {
        ExamDraft {
            exam_name: self.exam_name,
            sigtap_code: self.sigtap_code,
            value: self.value,
            reference_range: self.reference_range,
            unit: self.unit,
            laboratory: self.laboratory,
            requesting_doctor: self.requesting_doctor,
            date: self.date,
            notes: self.notes,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawExtraction {
    #[serde(alias = "name")]
    exam_name: Option<String>,
    #[serde(alias = "code")]
    sigtap_code: Option<String>,
    value: Option<NumberOrText>,
    reference_range: Option<String>,
    unit: Option<String>,
    laboratory: Option<String>,
    requesting_doctor: Option<String>,
    date: Option<String>,
    notes: Option<String>,
}

impl RawExtraction {
    fn resolve(self, default_date: NaiveDate) -> Option<ExtractedExam> {
        let exam_name = non_blank(self.exam_name)?;

        let value = match self.value {
            Some(NumberOrText::Number(number)) if number.is_finite() => number,
            // "13,8 g/dL" reads as 13.8; "NaN" or "n/d" hold no digits.
            Some(NumberOrText::Text(text)) => extract_numbers(&text)
                .first()
                .copied()
                .filter(|number| number.is_finite())
                .unwrap_or_else(|| {
                    debug!(exam = %exam_name, raw = %text, "unreadable value, using 0");
                    0.0
                }),
            _ => 0.0,
        };

        let parsed_date = self.date.as_deref().and_then(parse_document_date);

        Some(ExtractedExam {
            sigtap_code: non_blank(self.sigtap_code).unwrap_or_default(),
            value,
            reference_range: non_blank(self.reference_range)
                .unwrap_or_else(|| NOT_INFORMED.to_string()),
            unit: non_blank(self.unit),
            laboratory: non_blank(self.laboratory).unwrap_or_default(),
            requesting_doctor: non_blank(self.requesting_doctor).unwrap_or_default(),
            date: parsed_date.unwrap_or(default_date),
            date_assumed: parsed_date.is_none(),
            notes: non_blank(self.notes),
            exam_name,
        })
    }
}

/// Decode the service reply: a JSON array, or an object with an `exams` array.
pub fn decode_extraction_str(
    text: &str,
    default_date: NaiveDate,
) -> Result<Vec<ExtractedExam>, TrackerError> {
    let value: Value =
        serde_json::from_str(text).map_err(|err| TrackerError::Parse(err.to_string()))?;
    decode_extraction_value(&value, default_date)
}

pub fn decode_extraction_value(
    value: &Value,
    default_date: NaiveDate,
) -> Result<Vec<ExtractedExam>, TrackerError> {
    let entries = value
        .as_array()
        .or_else(|| value.get("exams").and_then(Value::as_array))
        .ok_or(TrackerError::MissingData)?;

    let mut exams = Vec::with_capacity(entries.len());
    for (position, entry) in entries.iter().enumerate() {
        let raw = match RawExtraction::deserialize(entry) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(position, error = %err, "skipping malformed extraction entry");
                continue;
            }
        };
        match raw.resolve(default_date) {
            Some(exam) => exams.push(exam),
            None => warn!(position, "skipping extraction entry without exam name"),
        }
    }
    Ok(exams)
}

fn parse_document_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    // Timestamps are cut down to their date part.
    let candidate = trimmed.get(..10).filter(|_| trimmed.contains('T')).unwrap_or(trimmed);
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(candidate, format).ok())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fallback_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
    }

    #[test]
    fn missing_fields_get_fallbacks() {
        let exams = decode_extraction_str(r#"[{"examName": "Ferritina"}]"#, fallback_date())
            .unwrap();
        let exam = &exams[0];
        assert_eq!(exam.value, 0.0);
        assert_eq!(exam.reference_range, NOT_INFORMED);
        assert_eq!(exam.date, fallback_date());
        assert!(exam.date_assumed);
        assert_eq!(exam.laboratory, "");
        assert_eq!(exam.unit, None);
    }

    #[test]
    fn text_values_and_local_dates() {
        let reply = r#"{"exams": [
            {"name": "Hemoglobina", "value": "13,8", "date": "05/02/2024", "unit": "g/dL"},
            {"name": "Ureia", "value": "n/d", "date": "2024-02-05T08:30:00Z"}
        ]}"#;
        let exams = decode_extraction_str(reply, fallback_date()).unwrap();
        assert_eq!(exams[0].value, 13.8);
        assert_eq!(exams[0].date, NaiveDate::from_ymd_opt(2024, 2, 5).unwrap());
        assert!(!exams[0].date_assumed);
        assert_eq!(exams[1].value, 0.0);
        assert_eq!(exams[1].date, NaiveDate::from_ymd_opt(2024, 2, 5).unwrap());
    }

    #[test]
    fn text_values_with_units_or_non_numbers() {
        let reply = r#"[
            {"examName": "Hemoglobina", "value": "13,8 g/dL"},
            {"examName": "Ureia", "value": "NaN"},
            {"examName": "Creatinina", "value": "inf"},
            {"examName": "Potássio", "value": "Infinity"}
        ]"#;
        let exams = decode_extraction_str(reply, fallback_date()).unwrap();
        let values: Vec<f64> = exams.iter().map(|exam| exam.value).collect();
        assert_eq!(values, vec![13.8, 0.0, 0.0, 0.0]);

        let mut ledger = sigalab_core::ExamLedger::new();
        for exam in exams {
            ledger.add("user-1", exam.into_draft()).unwrap();
        }
        assert_eq!(ledger.len(), 4);
    }

    #[test]
    fn nameless_and_malformed_entries_are_skipped() {
        let reply = r#"[{"value": 10}, 42, {"examName": "TSH", "value": 2.5}]"#;
        let exams = decode_extraction_str(reply, fallback_date()).unwrap();
        assert_eq!(exams.len(), 1);
        assert_eq!(exams[0].exam_name, "TSH");
    }

    #[test]
    fn unusable_replies_are_errors() {
        assert!(matches!(
            decode_extraction_str("nope", fallback_date()),
            Err(TrackerError::Parse(_))
        ));
        assert!(matches!(
            decode_extraction_str(r#"{"result": []}"#, fallback_date()),
            Err(TrackerError::MissingData)
        ));
    }

    #[test]
    fn extracted_exam_becomes_draft() {
        let exams = decode_extraction_str(
            r#"[{"examName": "Glicose", "value": 99, "referenceRange": "70-99", "notes": " "}]"#,
            fallback_date(),
        )
        .unwrap();
        let draft = exams.into_iter().next().unwrap().into_draft();
        assert_eq!(draft.value, 99.0);
        assert_eq!(draft.notes, None);
        assert_eq!(draft.reference_range, "70-99");
    }
}
