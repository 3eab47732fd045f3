//! Narrative summaries of a user's history from the language model.

use serde::Serialize;
use sigalab_core::{ExamRecord, TrackerError};
use tracing::warn;

pub const ANALYSIS_FALLBACK: &str =
    "Não foi possível gerar a análise clínica automática no momento.";

/// History entry as sent to the model; identifiers stay out of the prompt.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PromptExam<'a> {
    exam_name: &'a str,
    value: f64,
    reference_range: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit: Option<&'a str>,
    date: chrono::NaiveDate,
    #[serde(skip_serializing_if = "str::is_empty")]
    laboratory: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<&'a str>,
}

impl<'a> From<&'a ExamRecord> for PromptExam<'a> {
    fn from(record: &'a ExamRecord) -> Self {
        Self {
            exam_name: &record.exam_name,
            value: record.value,
            reference_range: &record.reference_range,
            unit: record.unit.as_deref(),
            date: record.date,
            laboratory: &record.laboratory,
            notes: record.notes.as_deref(),
        }
    }
}

/// Request for an evolution summary.
#[derive(Debug)]
pub struct AnalysisRequest<'a> {
    records: &'a [ExamRecord],
    conditions: &'a str,
}

impl<'a> AnalysisRequest<'a> {
    /// `None` when there is no history to analyse.
    pub fn new(records: &'a [ExamRecord], conditions: &'a str) -> Option<Self> {
        if records.is_empty() {
            return None;
        }
        Some(Self {
            records,
            conditions,
        })
    }

    pub fn prompt(&self) -> Result<String, TrackerError> {
        let history: Vec<PromptExam<'_>> = self.records.iter().map(PromptExam::from).collect();
        let history =
            serde_json::to_string(&history).map_err(|err| TrackerError::Parse(err.to_string()))?;
        let conditions = match self.conditions.trim() {
            "" => "Nenhuma",
            text => text,
        };

        Ok(format!(
            "Analise o histórico de exames: {history}. \
             Condições preexistentes do paciente: {conditions}. \
             Forneça um resumo executivo da evolução clínica em português, \
             destacando tendências preocupantes ou melhorias."
        ))
    }
}

/// Text shown to the user, never empty.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    pub text: String,
    pub is_fallback: bool,
}

impl AnalysisOutcome {
    pub fn from_response(response: Option<String>) -> Self {
        match response.map(|text| text.trim().to_string()) {
            Some(text) if !text.is_empty() => Self {
                text,
                is_fallback: false,
            },
            _ => {
                warn!("analysis service returned no text");
                Self::fallback()
            }
        }
    }

    pub fn fallback() -> Self {
        Self {
            text: ANALYSIS_FALLBACK.to_string(),
            is_fallback: true,
        }
    }
}
