//! CaseStore - append-only journal for immutable records
//!
//! Records are kept as one pretty-printed JSON array, in append order. There
//! is no update or delete: the only mutation is `append`.
//!
//! # Architecture
//!
//! ```text
//! ~/.local/share/legalease/
//! ├── cases.json        # [ {record}, {record}, ... ]
//! └── cases.json.lock   # advisory lock held during appends
//! ```
//!
//! # Example
//!
//! ```ignore
//! use casestore::Journal;
//!
//! let mut journal: Journal<MyRecord> = Journal::open("cases.json")?;
//! journal.append(record)?;
//! for r in journal.records() { ... }
//! ```

pub mod cli;
pub mod config;
mod error;
mod journal;

pub use error::JournalError;
pub use journal::{Journal, Record};

/// Default journal file name
pub const DEFAULT_FILE_NAME: &str = "cases.json";
