//! Reference-range parsing and result classification.
//!
//! Ranges are free text written by people or returned by the procedure lookup
//! ("70-99", "até 150", "> 40 mg/dL", "Não informado"). Classification never
//! fails: anything that cannot be read as a bound ends up as
//! [`RangeStatus::Unknown`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ClassifierConfig;

static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-?\d+(?:[.,]\d+)?").expect("valid number regex"));

static UPPER_ONLY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:até|ate|up to|max|máx|maximo|máximo|maxima|máxima|maximum|inferior a|menor que|menor ou igual|below)\b|[<≤]",
    )
    .expect("valid upper-bound marker regex")
});

static LOWER_ONLY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:min|mín|minimo|mínimo|minima|mínima|minimum|no mínimo|acima de|superior a|maior que|maior ou igual|at least|above)\b|[>≥]",
    )
    .expect("valid lower-bound marker regex")
});

static DEFAULT_CLASSIFIER: Lazy<RangeClassifier> = Lazy::new(RangeClassifier::default);

/// Clinical status of a result relative to its reference range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RangeStatus {
    Unknown,
    Normal,
    Alert,
    Critical,
}

impl RangeStatus {
    /// Portuguese label shown next to the result.
    pub fn label(self) -> &'static str {
        match self {
            RangeStatus::Unknown => "Sem referência",
            RangeStatus::Normal => "Normal",
            RangeStatus::Alert => "Atenção",
            RangeStatus::Critical => "Crítico",
        }
    }

    /// Style key for the UI; `neutral` is rendered gray.
    pub fn tone(self) -> &'static str {
        match self {
            RangeStatus::Unknown => "neutral",
            RangeStatus::Normal => "normal",
            RangeStatus::Alert => "alert",
            RangeStatus::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Classification {
    pub status: RangeStatus,
    pub label: String,
}

impl From<RangeStatus> for Classification {
    fn from(status: RangeStatus) -> Self {
        Self {
            status,
            label: status.label().to_string(),
        }
    }
}

/// Bounds read from a range text. `None` stands for an open side.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ReferenceBounds {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl ReferenceBounds {
    fn evaluate(&self, value: f64, config: &ClassifierConfig) -> RangeStatus {
        let lower = self.lower.unwrap_or(f64::NEG_INFINITY);
        let upper = self.upper.unwrap_or(f64::INFINITY);

        if value < lower || value > upper {
            return RangeStatus::Critical;
        }

        let near_bound = match (self.lower, self.upper) {
            (Some(min), Some(max)) => {
                let margin = (max - min) * config.margin_ratio;
                value < min + margin || value > max - margin
            }
            (None, Some(max)) => value > max * config.upper_only_alert_ratio,
            // Minimum-only ranges have no margin band.
            _ => false,
        };

        if near_bound {
            RangeStatus::Alert
        } else {
            RangeStatus::Normal
        }
    }
}

/// Classifier bound to a set of thresholds.
#[derive(Debug, Clone, Default)]
pub struct RangeClassifier {
    config: ClassifierConfig,
}

impl RangeClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn classify(&self, value: f64, reference_range: &str) -> Classification {
        Classification::from(self.status(value, reference_range))
    }

    pub fn status(&self, value: f64, reference_range: &str) -> RangeStatus {
        if reference_range.trim().is_empty() || self.config.is_not_informed(reference_range) {
            return RangeStatus::Unknown;
        }

        if !value.is_finite() {
            debug!(value, "non-finite result cannot be classified");
            return RangeStatus::Unknown;
        }

        match parse_reference_range(reference_range) {
            Some(bounds) => bounds.evaluate(value, &self.config),
            None => {
                debug!(reference_range, "no numeric bound in reference range");
                RangeStatus::Unknown
            }
        }
    }
}

/// Classify with the default thresholds.
pub fn classify(value: f64, reference_range: &str) -> Classification {
    DEFAULT_CLASSIFIER.classify(value, reference_range)
}

/// Read the bounds of a range text, or `None` when it holds no number.
///
/// A single number is a maximum unless the text marks it as a minimum
/// ("mín", ">"). With two or more numbers the first two form the interval in
/// whatever order they were written.
pub fn parse_reference_range(text: &str) -> Option<ReferenceBounds> {
    let numbers = extract_numbers(text);

    match numbers.as_slice() {
        [] => None,
        [single] => {
            let bound = *single;
            if UPPER_ONLY_RE.is_match(text) {
                Some(ReferenceBounds {
                    lower: None,
                    upper: Some(bound),
                })
            } else if LOWER_ONLY_RE.is_match(text) {
                Some(ReferenceBounds {
                    lower: Some(bound),
                    upper: None,
                })
            } else {
                Some(ReferenceBounds {
                    lower: None,
                    upper: Some(bound),
                })
            }
        }
        [a, b, ..] => Some(ReferenceBounds {
            lower: Some(a.min(*b)),
            upper: Some(a.max(*b)),
        }),
    }
}

/// Every decimal number in `text`, left to right.
///
/// A hyphen glued to a number counts as a sign only when it does not follow
/// another number, so "70-99" reads as 70 and 99.
pub fn extract_numbers(text: &str) -> Vec<f64> {
    NUMBER_RE
        .find_iter(text)
        .filter_map(|found| {
            let token = found.as_str();
            let token = match token.strip_prefix('-') {
                Some(unsigned) if follows_number(&text[..found.start()]) => unsigned,
                _ => token,
            };
            parse_decimal(token)
        })
        .collect()
}

/// Parse a number written with either `,` or `.` as the decimal separator.
pub fn parse_decimal(token: &str) -> Option<f64> {
    token.trim().replace(',', ".").parse::<f64>().ok()
}

fn follows_number(prefix: &str) -> bool {
    prefix
        .trim_end()
        .chars()
        .next_back()
        .is_some_and(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(value: f64, range: &str) -> RangeStatus {
        classify(value, range).status
    }

    #[test]
    fn two_sided_range_tiers() {
        assert_eq!(status(70.0, "70-99"), RangeStatus::Alert);
        assert_eq!(status(85.0, "70-99"), RangeStatus::Normal);
        assert_eq!(status(60.0, "70-99"), RangeStatus::Critical);
        assert_eq!(status(99.0, "70-99"), RangeStatus::Alert);
        assert_eq!(status(150.0, "70-99"), RangeStatus::Critical);
    }

    #[test]
    fn upper_only_range_tiers() {
        assert_eq!(status(200.0, "até 150"), RangeStatus::Critical);
        assert_eq!(status(140.0, "até 150"), RangeStatus::Alert);
        assert_eq!(status(100.0, "até 150"), RangeStatus::Normal);
    }

    #[test]
    fn values_on_band_edges() {
        assert_eq!(status(150.0, "até 150"), RangeStatus::Alert);
        assert_eq!(status(135.0, "até 150"), RangeStatus::Normal);
        assert_eq!(status(135.1, "até 150"), RangeStatus::Alert);
        assert_eq!(status(72.9, "70-99"), RangeStatus::Normal);
        assert_eq!(status(72.8, "70-99"), RangeStatus::Alert);
        assert_eq!(status(96.1, "70-99"), RangeStatus::Normal);
        assert_eq!(status(96.2, "70-99"), RangeStatus::Alert);
    }

    #[test]
    fn descending_range_matches_ascending() {
        for value in [50.0, 70.0, 72.0, 85.0, 97.0, 99.0, 120.0] {
            assert_eq!(status(value, "99 - 70"), status(value, "70 - 99"));
        }
    }

    #[test]
    fn text_without_numbers_is_unknown() {
        for range in ["", "   ", "Não informado", "N/A", "negativo", "ver laudo"] {
            let result = classify(12.0, range);
            assert_eq!(result.status, RangeStatus::Unknown, "range {range:?}");
            assert_eq!(result.label, "Sem referência");
        }
    }

    #[test]
    fn bare_single_number_is_a_maximum() {
        assert_eq!(
            parse_reference_range("200"),
            Some(ReferenceBounds {
                lower: None,
                upper: Some(200.0)
            })
        );
        assert_eq!(status(250.0, "200"), RangeStatus::Critical);
        assert_eq!(status(10.0, "200"), RangeStatus::Normal);
    }

    #[test]
    fn upper_markers() {
        for range in [
            "< 5,7",
            "Máximo 5.7",
            "up to 5.7",
            "inferior a 5,7 %",
            "máx. 5,7",
            "Máxima: 5,7",
            "maximum 5.7",
            "menor ou igual a 5,7",
        ] {
            assert_eq!(
                parse_reference_range(range),
                Some(ReferenceBounds {
                    lower: None,
                    upper: Some(5.7)
                }),
                "range {range:?}"
            );
        }
    }

    #[test]
    fn lower_markers_have_no_margin() {
        for range in [
            "> 40",
            "mínimo 40",
            "Acima de 40 mg/dL",
            "min 40",
            "minimum 40",
            "Mínima: 40",
            "maior ou igual a 40",
            "no mínimo 40 mg/dL",
        ] {
            assert_eq!(
                parse_reference_range(range),
                Some(ReferenceBounds {
                    lower: Some(40.0),
                    upper: None
                }),
                "range {range:?}"
            );
        }
        assert_eq!(status(30.0, "> 40"), RangeStatus::Critical);
        assert_eq!(status(40.0, "> 40"), RangeStatus::Normal);
        assert_eq!(status(41.0, "> 40"), RangeStatus::Normal);
        assert_eq!(status(10_000.0, "> 40"), RangeStatus::Normal);
        assert_eq!(status(100.0, "minimum 40"), RangeStatus::Normal);
    }

    #[test]
    fn comma_decimals_and_extra_numbers() {
        assert_eq!(extract_numbers("0,4 a 4,0 mUI/L"), vec![0.4, 4.0]);
        assert_eq!(
            parse_reference_range("3.5 - 5.1 (adultos 18-60)"),
            Some(ReferenceBounds {
                lower: Some(3.5),
                upper: Some(5.1)
            })
        );
    }

    #[test]
    fn hyphen_between_numbers_is_not_a_sign() {
        assert_eq!(extract_numbers("70-99"), vec![70.0, 99.0]);
        assert_eq!(extract_numbers("70 -99"), vec![70.0, 99.0]);
        assert_eq!(extract_numbers("-5 a 5"), vec![-5.0, 5.0]);
    }

    #[test]
    fn non_finite_value_is_unknown() {
        assert_eq!(status(f64::NAN, "70-99"), RangeStatus::Unknown);
        assert_eq!(status(f64::INFINITY, "70-99"), RangeStatus::Unknown);
    }

    #[test]
    fn zero_value_from_extraction_is_classified() {
        assert_eq!(status(0.0, "70-99"), RangeStatus::Critical);
        assert_eq!(status(0.0, "Não informado"), RangeStatus::Unknown);
    }

    #[test]
    fn custom_thresholds() {
        let classifier = RangeClassifier::new(ClassifierConfig {
            margin_ratio: 0.0,
            upper_only_alert_ratio: 1.0,
            not_informed_markers: vec!["sem ref".to_string()],
        });
        assert_eq!(classifier.status(70.0, "70-99"), RangeStatus::Normal);
        assert_eq!(classifier.status(149.0, "até 150"), RangeStatus::Normal);
        assert_eq!(classifier.status(5.0, "Sem ref"), RangeStatus::Unknown);
    }

    #[test]
    fn tones_are_distinct() {
        let tones = [
            RangeStatus::Unknown,
            RangeStatus::Normal,
            RangeStatus::Alert,
            RangeStatus::Critical,
        ]
        .map(RangeStatus::tone);
        assert_eq!(tones, ["neutral", "normal", "alert", "critical"]);
    }
}
