//! Dashboard and report views assembled from the history helpers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::{RangeClassifier, RangeStatus};
use crate::config::TrackerConfig;
use crate::history::{
    chronological_records, chronological_series, count_by, group_by_exam_name,
    most_frequent_exam_name, ExamField, FieldCounts, SeriesPoint,
};
use crate::record::ExamRecord;

/// Headline figures of the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_exams: usize,
    /// Name of the last record entered, regardless of its date.
    pub latest_exam_name: Option<String>,
    pub most_frequent_exam: Option<String>,
    /// Chronological series of the most frequent exam.
    pub evolution: Vec<SeriesPoint>,
}

impl DashboardSummary {
    pub fn from_records(records: &[ExamRecord]) -> Self {
        let most_frequent = most_frequent_exam_name(records);
        Self {
            total_exams: records.len(),
            latest_exam_name: records.last().map(|record| record.exam_name.clone()),
            most_frequent_exam: most_frequent.map(str::to_string),
            evolution: most_frequent
                .map(|name| chronological_series(records, name))
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub value: f64,
    pub reference_range: String,
    pub status: RangeStatus,
}

/// Evolution of one exam type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExamTrend {
    pub exam_name: String,
    pub unit: Option<String>,
    pub points: Vec<TrendPoint>,
}

impl ExamTrend {
    pub fn latest(&self) -> Option<&TrendPoint> {
        self.points.last()
    }
}

/// Everything the reports page shows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryReport {
    pub generated_at: DateTime<Utc>,
    pub dashboard: DashboardSummary,
    pub laboratories: FieldCounts,
    pub doctors: FieldCounts,
    /// One trend per exam type, in order of first appearance.
    pub trends: Vec<ExamTrend>,
}

impl HistoryReport {
    pub fn build(records: &[ExamRecord], config: &TrackerConfig) -> Self {
        let classifier = RangeClassifier::new(config.classifier.clone());
        let trends = group_by_exam_name(records)
            .names()
            .map(|name| build_trend(records, name, &classifier))
            .collect();

        Self {
            generated_at: Utc::now(),
            dashboard: DashboardSummary::from_records(records),
            laboratories: count_by(records, ExamField::Laboratory),
            doctors: count_by(records, ExamField::RequestingDoctor),
            trends,
        }
    }

    pub fn trend(&self, exam_name: &str) -> Option<&ExamTrend> {
        self.trends.iter().find(|trend| trend.exam_name == exam_name)
    }

    /// Latest point of each exam type that is not normal, most severe first.
    pub fn attention_points(&self) -> Vec<(&str, &TrendPoint)> {
        let mut flagged: Vec<(&str, &TrendPoint)> = self
            .trends
            .iter()
            .filter_map(|trend| trend.latest().map(|point| (trend.exam_name.as_str(), point)))
            .filter(|(_, point)| matches!(point.status, RangeStatus::Alert | RangeStatus::Critical))
            .collect();
        flagged.sort_by_key(|(_, point)| point.status != RangeStatus::Critical);
        flagged
    }
}

fn build_trend(records: &[ExamRecord], exam_name: &str, classifier: &RangeClassifier) -> ExamTrend {
    let ordered = chronological_records(records, exam_name);
    let unit = ordered.iter().find_map(|record| record.unit.clone());
    let points = ordered
        .into_iter()
        .map(|record| TrendPoint {
            date: record.date,
            value: record.value,
            reference_range: record.reference_range.clone(),
            status: classifier.status(record.value, &record.reference_range),
        })
        .collect();

    ExamTrend {
        exam_name: exam_name.to_string(),
        unit,
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::tests::record;

    #[test]
    fn dashboard_of_empty_history() {
        let summary = DashboardSummary::from_records(&[]);
        assert_eq!(summary.total_exams, 0);
        assert_eq!(summary.latest_exam_name, None);
        assert_eq!(summary.most_frequent_exam, None);
        assert!(summary.evolution.is_empty());
    }

    #[test]
    fn dashboard_uses_entry_order_for_latest() {
        let records = vec![
            record("a", "Glicose", "2024-03-01", 90.0),
            record("b", "Glicose", "2024-01-01", 85.0),
            record("c", "TSH", "2023-12-01", 2.0),
        ];
        let summary = DashboardSummary::from_records(&records);
        assert_eq!(summary.total_exams, 3);
        assert_eq!(summary.latest_exam_name.as_deref(), Some("TSH"));
        assert_eq!(summary.most_frequent_exam.as_deref(), Some("Glicose"));
        let values: Vec<f64> = summary.evolution.iter().map(|point| point.value).collect();
        assert_eq!(values, vec![85.0, 90.0]);
    }

    #[test]
    fn report_classifies_every_point() {
        let mut records = vec![
            record("a", "Glicose", "2024-03-01", 150.0),
            record("b", "Glicose", "2024-01-01", 85.0),
            record("c", "TSH", "2024-02-01", 2.0),
        ];
        records[2].reference_range = "0,4 a 4,0".to_string();
        records[2].unit = Some("mUI/L".to_string());

        let report = HistoryReport::build(&records, &TrackerConfig::default());
        let glicose = report.trend("Glicose").unwrap();
        let statuses: Vec<RangeStatus> = glicose.points.iter().map(|p| p.status).collect();
        assert_eq!(statuses, vec![RangeStatus::Normal, RangeStatus::Critical]);
        assert_eq!(glicose.unit, None);
        assert_eq!(report.trend("TSH").unwrap().unit.as_deref(), Some("mUI/L"));
        assert_eq!(report.laboratories.get(""), Some(3));

        let flagged = report.attention_points();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].0, "Glicose");
    }

    #[test]
    fn attention_points_put_critical_first() {
        let mut records = vec![
            record("a", "Glicose", "2024-01-01", 98.0),
            record("b", "Ureia", "2024-01-01", 80.0),
        ];
        records[1].reference_range = "15-40".to_string();

        let report = HistoryReport::build(&records, &TrackerConfig::default());
        let names: Vec<&str> = report.attention_points().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Ureia", "Glicose"]);
    }
}
