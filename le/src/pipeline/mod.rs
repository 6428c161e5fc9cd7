//! The case-processing pipeline
//!
//! Three model-backed stages, each returning an `Outcome` so the heuristic
//! branch is explicit, and the `Orchestrator` that sequences them inside a
//! bounded retry loop.

mod classifier;
mod drafter;
mod orchestrator;
pub mod parse;
mod validator;

pub use classifier::{Classifier, parse_classification};
pub use drafter::{Drafter, split_sections};
pub use orchestrator::{
    CaseRequest, MAX_RETRIES, MISSING_INFO_MARKER, Orchestrator, PipelineError, ProcessedCase, StageFallback, repair,
};
pub use validator::Validator;
