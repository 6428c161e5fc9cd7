//! LegalEase - legal case pipeline
//!
//! Takes a free-text description of a legal problem, classifies it, drafts a
//! remedial letter, validates the draft and retries with repaired facts, then
//! stores the finished case and exports it as a document.
//!
//! # Core Concepts
//!
//! - **Always a draft**: every stage has a deterministic fallback, so a case
//!   is produced even when the model backend is down or answers garbage
//! - **Bounded retries**: at most `MAX_RETRIES` repair rounds per case
//! - **Append-only store**: finished cases go to a JSON journal
//!
//! # Modules
//!
//! - [`llm`] - generation gateway and model clients
//! - [`prompts`] - stage templates
//! - [`pipeline`] - classifier, drafter, validator and retry controller
//! - [`state`] - case store actor
//! - [`export`] - Markdown and JSON rendering
//! - [`document`] - reading case text from files
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod config;
pub mod document;
pub mod domain;
pub mod export;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod state;

// Re-export commonly used types
pub use config::{Config, LlmConfig, PipelineConfig, RepairStrategy};
pub use domain::{
    Case, CaseId, CaseStatus, Category, Classification, DegradeReason, DraftDocument, Outcome, ValidationResult,
};
pub use export::{ExportFormat, Exporter, FileExporter};
pub use llm::{Gateway, LlmClient, LlmError, OfflineClient, ScriptedClient, create_client};
pub use pipeline::{CaseRequest, MAX_RETRIES, MISSING_INFO_MARKER, Orchestrator, PipelineError, ProcessedCase};
pub use prompts::{PromptLoader, SECTION_SENTINEL, Stage};
pub use state::{CaseStore, StateError};
