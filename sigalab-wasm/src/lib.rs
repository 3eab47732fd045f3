//! WASM <-> JavaScript bridge used by the browser UI.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use sigalab_assist::{decode_extraction_str, decode_lookup_response};
use sigalab_core::{
    chronological_series, unique_exam_names, ExamFilters, ExamRecord, HistoryReport,
    RangeClassifier, TrackerConfig, TrackerError,
};
use wasm_bindgen::prelude::*;

#[derive(Deserialize, Default)]
struct JsTrackerConfig {
    #[serde(default)]
    margin_ratio: Option<f64>,
    #[serde(default)]
    upper_only_alert_ratio: Option<f64>,
    #[serde(default)]
    not_informed_markers: Option<Vec<String>>,
}

impl From<JsTrackerConfig> for TrackerConfig {
    fn from(cfg: JsTrackerConfig) -> Self {
        let mut base = TrackerConfig::default();
        if let Some(ratio) = cfg.margin_ratio {
            base.classifier.margin_ratio = ratio;
        }
        if let Some(ratio) = cfg.upper_only_alert_ratio {
            base.classifier.upper_only_alert_ratio = ratio;
        }
        if let Some(markers) = cfg.not_informed_markers {
            base.classifier.not_informed_markers = markers;
        }
        base
    }
}

fn read_config(config: Option<JsValue>) -> Result<TrackerConfig, JsValue> {
    match config {
        Some(js_cfg) if !js_cfg.is_undefined() && !js_cfg.is_null() => {
            let cfg: JsTrackerConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Could not read config: {err}")))?;
            Ok(TrackerConfig::from(cfg))
        }
        _ => Ok(TrackerConfig::default()),
    }
}

fn read_records(records: JsValue) -> Result<Vec<ExamRecord>, JsValue> {
    from_value::<Vec<ExamRecord>>(records)
        .map_err(|err| JsValue::from_str(&format!("Could not read exam records: {err}")))
}

fn write<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    to_value(value).map_err(|err| JsValue::from_str(&format!("Could not serialize result: {err}")))
}

fn format_tracker_error(err: TrackerError) -> JsValue {
    JsValue::from_str(&format!("Tracker error: {err}"))
}

/// `{ status, label }` for one result.
#[wasm_bindgen]
pub fn classify_result(
    value: f64,
    reference_range: &str,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    let cfg = read_config(config)?;
    let classifier = RangeClassifier::new(cfg.classifier);
    write(&classifier.classify(value, reference_range))
}

#[wasm_bindgen]
pub fn build_history_report(records: JsValue, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let records = read_records(records)?;
    let cfg = read_config(config)?;
    write(&HistoryReport::build(&records, &cfg))
}

#[wasm_bindgen]
pub fn exam_series(records: JsValue, exam_name: &str) -> Result<JsValue, JsValue> {
    let records = read_records(records)?;
    write(&chronological_series(&records, exam_name))
}

#[wasm_bindgen]
pub fn exam_names(records: JsValue) -> Result<JsValue, JsValue> {
    let records = read_records(records)?;
    write(&unique_exam_names(&records))
}

/// Records matching the exam-list filters, in their original order.
#[wasm_bindgen]
pub fn filter_exams(records: JsValue, filters: JsValue) -> Result<JsValue, JsValue> {
    let records = read_records(records)?;
    let filters: ExamFilters = from_value(filters)
        .map_err(|err| JsValue::from_str(&format!("Could not read filters: {err}")))?;
    write(&filters.apply(&records))
}

#[wasm_bindgen]
pub fn decode_lookup(reply: &str) -> Result<JsValue, JsValue> {
    write(&decode_lookup_response(reply))
}

/// `default_date` (YYYY-MM-DD) stands in for exams the document does not date.
#[wasm_bindgen]
pub fn decode_extraction(reply: &str, default_date: &str) -> Result<JsValue, JsValue> {
    let default_date = NaiveDate::parse_from_str(default_date, "%Y-%m-%d")
        .map_err(|err| JsValue::from_str(&format!("Invalid default date: {err}")))?;
    let exams = decode_extraction_str(reply, default_date).map_err(format_tracker_error)?;
    write(&exams)
}
