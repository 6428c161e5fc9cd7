//! Case store with actor pattern
//!
//! `CaseStore` owns the case journal and processes commands via channels,
//! giving every concurrent pipeline a single serialized writer.

mod manager;
mod messages;

pub use manager::CaseStore;
pub use messages::{StateCommand, StateError, StateResponse};
