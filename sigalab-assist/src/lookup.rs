//! Procedure lookup: "given a free-text query, list matching SIGTAP procedures".

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sigalab_core::ExamDraft;
use tracing::warn;

/// Shortest query worth sending to the lookup service.
pub const MIN_QUERY_LEN: usize = 2;

/// A query the lookup service will accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupQuery(String);

impl LookupQuery {
    /// `None` for queries shorter than [`MIN_QUERY_LEN`] characters after trimming.
    pub fn new(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.chars().count() < MIN_QUERY_LEN {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn prompt(&self) -> String {
        format!(
            "Liste exames laboratoriais da tabela SIGTAP que correspondam a \"{}\". \
             Retorne apenas um array JSON com objetos contendo: code (8 dígitos), name, \
             referenceRange (ex: \"70-99\"), unit (ex: \"mg/dL\").",
            self.0
        )
    }

    /// JSON schema the service is asked to answer with.
    pub fn response_schema() -> Value {
        json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "code": { "type": "STRING" },
                    "name": { "type": "STRING" },
                    "referenceRange": { "type": "STRING" },
                    "unit": { "type": "STRING" }
                },
                "required": ["code", "name", "referenceRange", "unit"]
            }
        })
    }
}

/// A procedure suggested by the lookup service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureCandidate {
    pub code: String,
    pub name: String,
    pub reference_range: String,
    pub unit: String,
}

/// Values the user types next to the chosen procedure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManualEntry {
    pub value: f64,
    pub date: NaiveDate,
    #[serde(default)]
    pub laboratory: String,
    #[serde(default)]
    pub requesting_doctor: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ProcedureCandidate {
    pub fn into_draft(self, entry: ManualEntry) -> ExamDraft {
        let unit = Some(self.unit).filter(|unit| !unit.trim().is_empty());
        ExamDraft {
            exam_name: self.name,
            sigtap_code: self.code,
            value: entry.value,
            reference_range: self.reference_range,
            unit,
            laboratory: entry.laboratory,
            requesting_doctor: entry.requesting_doctor,
            date: entry.date,
            notes: entry.notes,
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawCandidate {
    code: Option<String>,
    name: Option<String>,
    reference_range: Option<String>,
    unit: Option<String>,
}

/// Decode the service reply. Anything unreadable yields an empty list.
pub fn decode_lookup_response(text: &str) -> Vec<ProcedureCandidate> {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "lookup reply is not JSON");
            return Vec::new();
        }
    };
    decode_lookup_value(&value)
}

pub fn decode_lookup_value(value: &Value) -> Vec<ProcedureCandidate> {
    let Some(entries) = value.as_array() else {
        warn!("lookup reply is not a JSON array");
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let raw: RawCandidate = serde_json::from_value(entry.clone()).ok()?;
            let name = raw.name.map(|name| name.trim().to_string())?;
            if name.is_empty() {
                return None;
            }
            Some(ProcedureCandidate {
                code: raw.code.unwrap_or_default(),
                name,
                reference_range: raw.reference_range.unwrap_or_default(),
                unit: raw.unit.unwrap_or_default(),
            })
        })
        .collect()
}
