//! Grouping and counting over a user's exam history.
//!
//! Every function here is a pure view over a slice of records. Exam names are
//! compared as exact strings: "Glicose" and "glicose" are different exam types.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::record::ExamRecord;

/// Records of one exam type, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct ExamGroup<'a> {
    pub exam_name: &'a str,
    pub records: Vec<&'a ExamRecord>,
}

/// Records grouped by exam name. Groups iterate in order of first appearance.
#[derive(Debug, Clone, Default)]
pub struct ExamGroups<'a> {
    groups: Vec<ExamGroup<'a>>,
    index: HashMap<&'a str, usize>,
}

impl<'a> ExamGroups<'a> {
    pub fn get(&self, exam_name: &str) -> Option<&[&'a ExamRecord]> {
        self.index
            .get(exam_name)
            .map(|&slot| self.groups[slot].records.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExamGroup<'a>> {
        self.groups.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.groups.iter().map(|group| group.exam_name)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

pub fn group_by_exam_name(records: &[ExamRecord]) -> ExamGroups<'_> {
    let mut grouped = ExamGroups::default();
    for record in records {
        let name = record.exam_name.as_str();
        match grouped.index.get(name) {
            Some(&slot) => grouped.groups[slot].records.push(record),
            None => {
                grouped.index.insert(name, grouped.groups.len());
                grouped.groups.push(ExamGroup {
                    exam_name: name,
                    records: vec![record],
                });
            }
        }
    }
    grouped
}

/// Name of the largest group. On a tie the group seen first wins.
pub fn most_frequent_exam_name(records: &[ExamRecord]) -> Option<&str> {
    let grouped = group_by_exam_name(records);
    let mut best: Option<&ExamGroup<'_>> = None;
    for group in grouped.iter() {
        if best.map_or(true, |current| group.records.len() > current.records.len()) {
            best = Some(group);
        }
    }
    best.map(|group| group.exam_name)
}

/// One point of an evolution chart.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Results of `exam_name` in ascending date order; same-day results keep input order.
pub fn chronological_series(records: &[ExamRecord], exam_name: &str) -> Vec<SeriesPoint> {
    chronological_records(records, exam_name)
        .into_iter()
        .map(|record| SeriesPoint {
            date: record.date,
            value: record.value,
        })
        .collect()
}

pub(crate) fn chronological_records<'a>(
    records: &'a [ExamRecord],
    exam_name: &str,
) -> Vec<&'a ExamRecord> {
    let mut matching: Vec<&ExamRecord> = records
        .iter()
        .filter(|record| record.exam_name == exam_name)
        .collect();
    // `sort_by_key` is stable, which is what keeps same-day entries in input order.
    matching.sort_by_key(|record| record.date);
    matching
}

/// Distinct exam names, sorted, for the exam picker.
pub fn unique_exam_names(records: &[ExamRecord]) -> Vec<String> {
    records
        .iter()
        .map(|record| record.exam_name.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Text fields that reports count by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExamField {
    ExamName,
    Laboratory,
    RequestingDoctor,
}

impl ExamField {
    pub fn select(self, record: &ExamRecord) -> &str {
        match self {
            ExamField::ExamName => &record.exam_name,
            ExamField::Laboratory => &record.laboratory,
            ExamField::RequestingDoctor => &record.requesting_doctor,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldCount {
    pub key: String,
    pub count: usize,
}

/// Occurrences per field value, in order of first appearance.
///
/// The empty string is an ordinary key (an unnamed laboratory or doctor).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<FieldCount>", into = "Vec<FieldCount>")]
pub struct FieldCounts {
    entries: Vec<FieldCount>,
}

impl FieldCounts {
    pub fn get(&self, key: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.count)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldCount> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn add(&mut self, key: &str) {
        match self.entries.iter_mut().find(|entry| entry.key == key) {
            Some(entry) => entry.count += 1,
            None => self.entries.push(FieldCount {
                key: key.to_string(),
                count: 1,
            }),
        }
    }
}

impl From<Vec<FieldCount>> for FieldCounts {
    fn from(entries: Vec<FieldCount>) -> Self {
        Self { entries }
    }
}

impl From<FieldCounts> for Vec<FieldCount> {
    fn from(counts: FieldCounts) -> Self {
        counts.entries
    }
}

pub fn count_by_field<F>(records: &[ExamRecord], selector: F) -> FieldCounts
where
    F: Fn(&ExamRecord) -> &str,
{
    let mut counts = FieldCounts::default();
    for record in records {
        counts.add(selector(record));
    }
    counts
}

pub fn count_by(records: &[ExamRecord], field: ExamField) -> FieldCounts {
    count_by_field(records, |record| field.select(record))
}
