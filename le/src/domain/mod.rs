//! Domain types for LegalEase
//!
//! Stage outputs, the persisted `Case`, and the `Outcome` wrapper that makes
//! the structured-vs-heuristic branch of every stage explicit.

mod case;
mod category;
mod documents;
mod id;
mod outcome;

pub use case::{Case, CaseStatus};
pub use category::Category;
pub use documents::{
    Classification, DraftDocument, MISSING_NAME_FACT, NAME_PLACEHOLDER, SUMMARY_FALLBACK_CHARS, ValidationResult,
    truncated_summary,
};
pub use id::{CASE_ID_LEN, CaseId};
pub use outcome::{DegradeReason, Outcome};
