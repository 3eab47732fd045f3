//! Boundary to the language-model collaborators: procedure lookup, document
//! extraction and evolution analysis.
//!
//! The network calls themselves belong to the host application. This crate
//! builds what is sent and turns whatever comes back into tracker types.

pub mod analysis;
pub mod extraction;
pub mod lookup;

pub use analysis::{AnalysisOutcome, AnalysisRequest, ANALYSIS_FALLBACK};
pub use extraction::{decode_extraction_str, decode_extraction_value, ExtractedExam};
pub use lookup::{
    decode_lookup_response, decode_lookup_value, LookupQuery, ManualEntry, ProcedureCandidate,
};
