//! Core logic of the lab-exam tracker: reference-range classification and
//! exam-history aggregation, plus the record ledger and account registry the
//! application builds on.

pub mod account;
pub mod classify;
pub mod config;
pub mod error;
pub mod filter;
pub mod history;
pub mod ledger;
pub mod record;
pub mod report;

pub use account::{AccountRegistry, RegistrationForm, UserProfile};
pub use classify::{
    classify, parse_reference_range, Classification, RangeClassifier, RangeStatus,
    ReferenceBounds,
};
pub use config::{ClassifierConfig, TrackerConfig, NOT_INFORMED};
pub use error::{TrackerError, TrackerResult};
pub use filter::ExamFilters;
pub use history::{
    chronological_series, count_by, count_by_field, group_by_exam_name,
    most_frequent_exam_name, unique_exam_names, ExamField, ExamGroup, ExamGroups, FieldCount,
    FieldCounts, SeriesPoint,
};
pub use ledger::ExamLedger;
pub use record::{ExamDraft, ExamRecord};
pub use report::{DashboardSummary, ExamTrend, HistoryReport, TrendPoint};
