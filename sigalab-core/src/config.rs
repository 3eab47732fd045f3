//! Tunable thresholds for classification.

use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

/// Sentinel written by the UI and by extraction when no range is known.
pub const NOT_INFORMED: &str = "Não informado";

/// Thresholds used by the reference-range classifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Share of a two-sided interval, measured inward from each bound, that is flagged as alert.
    pub margin_ratio: f64,
    /// Fraction of a maximum-only bound above which a result is flagged as alert.
    pub upper_only_alert_ratio: f64,
    /// Range texts meaning "no range", compared case-insensitively after trimming.
    pub not_informed_markers: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            margin_ratio: 0.1,
            upper_only_alert_ratio: 0.9,
            not_informed_markers: vec![NOT_INFORMED.to_string(), "N/A".to_string()],
        }
    }
}

impl ClassifierConfig {
    pub(crate) fn is_not_informed(&self, range: &str) -> bool {
        let trimmed = range.trim();
        self.not_informed_markers
            .iter()
            .any(|marker| marker.trim().to_lowercase() == trimmed.to_lowercase())
    }
}

/// Top-level configuration shared by the bridge and the CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct TrackerConfig {
    pub classifier: ClassifierConfig,
}

impl TrackerConfig {
    /// Parse a (possibly partial) JSON document; missing keys keep their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, TrackerError> {
        serde_json::from_str(raw).map_err(|err| TrackerError::Parse(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            TrackerConfig::from_json_str(r#"{"classifier": {"margin_ratio": 0.2}}"#).unwrap();
        assert_eq!(config.classifier.margin_ratio, 0.2);
        assert_eq!(config.classifier.upper_only_alert_ratio, 0.9);
        assert_eq!(config.classifier.not_informed_markers.len(), 2);
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(
            TrackerConfig::from_json_str("{}").unwrap(),
            TrackerConfig::default()
        );
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        assert!(matches!(
            TrackerConfig::from_json_str("{classifier"),
            Err(TrackerError::Parse(_))
        ));
    }

    #[test]
    fn sentinel_match_ignores_case_and_padding() {
        let config = ClassifierConfig::default();
        assert!(config.is_not_informed("  não informado "));
        assert!(config.is_not_informed("n/a"));
        assert!(!config.is_not_informed("70-99"));
    }
}
