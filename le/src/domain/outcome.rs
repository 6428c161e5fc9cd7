//! Two-branch result of a model-backed pipeline stage

use serde::Serialize;
use std::fmt;

/// Why a stage fell back to its deterministic path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "kebab-case")]
pub enum DegradeReason {
    /// The prompt template could not be rendered
    Prompt(String),
    /// The gateway failed or timed out
    Gateway(String),
    /// The model answered, but not in the expected structured form
    Unparseable(String),
    /// The drafting response carried no section markers
    Unsectioned,
}

impl fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegradeReason::Prompt(e) => write!(f, "prompt failure: {}", e),
            DegradeReason::Gateway(e) => write!(f, "gateway failure: {}", e),
            DegradeReason::Unparseable(e) => write!(f, "unparseable response: {}", e),
            DegradeReason::Unsectioned => write!(f, "response had no section markers"),
        }
    }
}

/// Result of a stage: either the structured answer or a heuristic stand-in
///
/// Both branches carry a usable value; callers that only need the value use
/// `into_value`, callers that report on quality match on the branch.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Structured(T),
    Degraded { value: T, reason: DegradeReason },
}

impl<T> Outcome<T> {
    pub fn degraded(value: T, reason: DegradeReason) -> Self {
        Outcome::Degraded { value, reason }
    }

    pub fn value(&self) -> &T {
        match self {
            Outcome::Structured(v) => v,
            Outcome::Degraded { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Outcome::Structured(v) => v,
            Outcome::Degraded { value, .. } => value,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Outcome::Degraded { .. })
    }

    pub fn reason(&self) -> Option<&DegradeReason> {
        match self {
            Outcome::Structured(_) => None,
            Outcome::Degraded { reason, .. } => Some(reason),
        }
    }
}
