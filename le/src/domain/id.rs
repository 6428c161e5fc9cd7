//! Case id generation

use std::fmt;

use serde::{Deserialize, Serialize};

/// Length of a case id in hex characters
pub const CASE_ID_LEN: usize = 8;

/// Short opaque case identifier: the first 8 hex digits of a random UUID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(String);

impl CaseId {
    /// Allocate a fresh random id
    ///
    /// Uniqueness within a store is enforced by the store itself; the
    /// controller re-rolls on a duplicate rejection.
    pub fn generate() -> Self {
        let simple = uuid::Uuid::new_v4().simple().to_string();
        Self(simple[..CASE_ID_LEN].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CaseId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
