//! Retry controller
//!
//! Runs one case through classify → draft → validate, repairing the facts and
//! redrafting while validation fails, up to `MAX_RETRIES` extra rounds. The
//! terminal state is assembled into a `Case`, appended to the case store and
//! handed to the exporter.
//!
//! Only store I/O is fatal. Every stage already guarantees a usable value.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::{Classifier, Drafter, Validator};
use crate::config::{Config, PipelineConfig, RepairStrategy};
use crate::domain::{
    Case, CaseId, CaseStatus, Category, Classification, DegradeReason, DraftDocument, Outcome, ValidationResult,
};
use crate::export::{ExportFormat, Exporter, FileExporter};
use crate::llm::{Gateway, LlmError};
use crate::prompts::{PromptLoader, Stage};
use crate::state::{CaseStore, StateError};

/// Repair rounds allowed after the initial draft/validate round
pub const MAX_RETRIES: u32 = 2;

/// Marker appended to the facts on every repair round
pub const MISSING_INFO_MARKER: &str = "[MISSING_INFO_PLACEHOLDER]";

/// Fresh ids tried before giving up on a store that keeps reporting duplicates
const ID_ATTEMPTS: usize = 5;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Case store error: {0}")]
    Store(#[from] StateError),

    #[error("Could not allocate a unique case id after {0} attempts")]
    IdExhausted(usize),

    #[error("Gateway setup failed: {0}")]
    Gateway(#[from] LlmError),

    #[error("Pipeline shut down")]
    Cancelled,
}

/// One unit of work for the pipeline
#[derive(Debug, Clone, Default)]
pub struct CaseRequest {
    pub text: String,
    pub jurisdiction: Option<String>,
    pub goal: Option<String>,
    /// Origin of the text, kept on the case
    pub source: Option<String>,
}

impl CaseRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// A stage that answered from its fallback path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageFallback {
    pub stage: String,
    /// 0 for classification and the first draft/validate round
    pub round: u32,
    pub reason: DegradeReason,
}

/// Result of `process_case`
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedCase {
    pub case: Case,
    /// Where the exporter put the case, if it succeeded
    pub export_path: Option<PathBuf>,
    pub fallbacks: Vec<StageFallback>,
}

impl ProcessedCase {
    /// Draft/validate rounds that ran (1 + retries)
    pub fn rounds(&self) -> u32 {
        self.case.retries + 1
    }
}

/// Where the retry loop stopped
struct Terminal {
    facts: String,
    draft: DraftDocument,
    validation: ValidationResult,
    retries: u32,
}

pub struct Orchestrator {
    classifier: Classifier,
    drafter: Drafter,
    validator: Validator,
    store: CaseStore,
    exporter: Option<Arc<dyn Exporter>>,
    settings: PipelineConfig,
}

impl Orchestrator {
    /// Wire the pipeline from its parts
    pub fn new(gateway: Gateway, prompts: Arc<PromptLoader>, store: CaseStore, settings: PipelineConfig) -> Self {
        debug!(backend = %gateway.backend(), "Orchestrator::new: called");
        Self {
            classifier: Classifier::new(gateway.clone(), prompts.clone()),
            drafter: Drafter::new(gateway.clone(), prompts.clone()),
            validator: Validator::new(gateway, prompts),
            store,
            exporter: None,
            settings,
        }
    }

    /// Build everything the configuration describes
    ///
    /// Prompt overrides are looked up under `prompt_root`. Must be called
    /// inside a tokio runtime (the case store actor is spawned here).
    pub fn from_config(config: &Config, prompt_root: &Path) -> Result<Self, PipelineError> {
        debug!("Orchestrator::from_config: called");
        let gateway = Gateway::from_config(&config.llm)?;
        let store = CaseStore::spawn(&config.storage.case_store)?;
        let exporter = FileExporter::new(&config.storage.export_dir, ExportFormat::Markdown);

        Ok(
            Self::new(gateway, Arc::new(PromptLoader::new(prompt_root)), store, config.pipeline.clone())
                .with_exporter(Arc::new(exporter)),
        )
    }

    pub fn with_exporter(mut self, exporter: Arc<dyn Exporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    pub fn store(&self) -> &CaseStore {
        &self.store
    }

    /// Process one case with explicit jurisdiction and goal
    pub async fn process_case(
        &self,
        raw_text: &str,
        jurisdiction: &str,
        goal: &str,
    ) -> Result<ProcessedCase, PipelineError> {
        self.process(CaseRequest {
            text: raw_text.to_string(),
            jurisdiction: Some(jurisdiction.to_string()),
            goal: Some(goal.to_string()),
            source: None,
        })
        .await
    }

    /// Process one request, filling blanks from the pipeline defaults
    pub async fn process(&self, request: CaseRequest) -> Result<ProcessedCase, PipelineError> {
        let jurisdiction = non_blank(request.jurisdiction.as_deref()).unwrap_or(self.settings.jurisdiction.as_str());
        let goal = non_blank(request.goal.as_deref()).unwrap_or(self.settings.goal.as_str());
        info!(len = request.text.len(), %jurisdiction, "Processing case");

        let mut fallbacks = Vec::new();

        // CLASSIFIED: one shot, never revisited
        let classification = take(self.classifier.classify(&request.text).await, Stage::Classify, 0, &mut fallbacks);
        info!(category = %classification.category, "Classified");

        let Terminal {
            facts,
            draft,
            validation,
            retries,
        } = self
            .run_rounds(&classification, jurisdiction, goal, &mut fallbacks)
            .await;

        let status = if validation.ok || !self.settings.flag_exhausted {
            CaseStatus::Drafted
        } else {
            CaseStatus::NeedsReview
        };

        let mut case = Case::assemble(
            CaseId::generate(),
            &classification,
            facts,
            jurisdiction,
            goal,
            draft,
            validation,
            retries,
            status,
        );
        if let Some(source) = request.source {
            case = case.with_source(source);
        }

        let case = self.persist(case).await?;
        let export_path = self.export(&case);

        info!(case_id = %case.case_id, status = %case.status, retries = case.retries, "Case stored");
        Ok(ProcessedCase {
            case,
            export_path,
            fallbacks,
        })
    }

    /// DRAFTED → VALIDATED → {DONE | DRAFTED(retry)}
    async fn run_rounds(
        &self,
        classification: &Classification,
        jurisdiction: &str,
        goal: &str,
        fallbacks: &mut Vec<StageFallback>,
    ) -> Terminal {
        let category: Category = classification.category;
        let mut facts = classification.summary.clone();
        let mut retries = 0;

        loop {
            let draft = take(
                self.drafter.draft(category, jurisdiction, &facts, goal).await,
                Stage::Draft,
                retries,
                fallbacks,
            );
            let validation = take(
                self.validator.validate(&draft.letter, &facts).await,
                Stage::Validate,
                retries,
                fallbacks,
            );

            if validation.ok {
                debug!(retries, "run_rounds: validation passed");
                return Terminal {
                    facts,
                    draft,
                    validation,
                    retries,
                };
            }

            if retries >= MAX_RETRIES {
                warn!(retries, missing = ?validation.missing_facts, "Retry ceiling reached, keeping last draft");
                return Terminal {
                    facts,
                    draft,
                    validation,
                    retries,
                };
            }

            info!(missing = ?validation.missing_facts, "Validation failed, repairing facts");
            facts = repair(&facts, &validation, self.settings.repair);
            retries += 1;
        }
    }

    /// Append under a fresh id, re-rolling when the store reports a clash
    async fn persist(&self, mut case: Case) -> Result<Case, PipelineError> {
        for attempt in 1..=ID_ATTEMPTS {
            match self.store.append(case.clone()).await {
                Ok(()) => return Ok(case),
                Err(e) if e.is_duplicate() => {
                    debug!(attempt, case_id = %case.case_id, "persist: id clash, regenerating");
                    case.case_id = CaseId::generate();
                }
                Err(e) => return Err(PipelineError::Store(e)),
            }
        }
        Err(PipelineError::IdExhausted(ID_ATTEMPTS))
    }

    fn export(&self, case: &Case) -> Option<PathBuf> {
        let exporter = self.exporter.as_ref()?;
        match exporter.export(case) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(case_id = %case.case_id, error = %e, "Export failed; case is stored");
                None
            }
        }
    }

    /// Run many requests with at most `jobs` in flight
    ///
    /// Results come back in request order.
    pub async fn process_batch(
        &self,
        requests: Vec<CaseRequest>,
        jobs: usize,
    ) -> Vec<Result<ProcessedCase, PipelineError>> {
        debug!(count = requests.len(), jobs, "process_batch: called");
        let semaphore = Arc::new(Semaphore::new(jobs.max(1)));

        let work = requests.into_iter().map(|request| {
            let semaphore = semaphore.clone();
            async move {
                let _permit = semaphore.acquire().await.map_err(|_| PipelineError::Cancelled)?;
                self.process(request).await
            }
        });

        futures::future::join_all(work).await
    }
}

/// Facts after one repair round
pub fn repair(facts: &str, validation: &ValidationResult, strategy: RepairStrategy) -> String {
    match strategy {
        RepairStrategy::Marker => format!("{} {}", facts, MISSING_INFO_MARKER),
        RepairStrategy::MissingFacts if validation.missing_facts.is_empty() => {
            format!("{} {}", facts, MISSING_INFO_MARKER)
        }
        RepairStrategy::MissingFacts => format!(
            "{} {} Missing: {}.",
            facts,
            MISSING_INFO_MARKER,
            validation.missing_facts.join("; ")
        ),
    }
}

fn take<T>(outcome: Outcome<T>, stage: Stage, round: u32, fallbacks: &mut Vec<StageFallback>) -> T {
    if let Some(reason) = outcome.reason() {
        debug!(%stage, round, %reason, "stage used its fallback");
        fallbacks.push(StageFallback {
            stage: stage.name().to_string(),
            round,
            reason: reason.clone(),
        });
    }
    outcome.into_value()
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
