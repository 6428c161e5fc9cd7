//! Integration tests for the LegalEase pipeline
//!
//! These drive the public API end to end with the offline and scripted
//! backends, a real case journal on disk, and the file exporter.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use legalease::config::{PipelineConfig, RepairStrategy};
use legalease::domain::{CaseStatus, Category, MISSING_NAME_FACT, NAME_PLACEHOLDER};
use legalease::export::{ExportFormat, FileExporter};
use legalease::llm::{Gateway, ScriptedClient};
use legalease::pipeline::{CaseRequest, Classifier, MAX_RETRIES, MISSING_INFO_MARKER, Orchestrator, Validator};
use legalease::prompts::{PromptLoader, Stage};
use legalease::state::CaseStore;
use proptest::prelude::*;
use tempfile::TempDir;

const WATER: &str = "My landlord shut off my water despite me paying rent on time.";

fn gateway(client: Arc<ScriptedClient>) -> Gateway {
    Gateway::new(client, Duration::from_secs(2), 1024)
}

fn orchestrator(client: Arc<ScriptedClient>, temp: &TempDir, settings: PipelineConfig) -> Orchestrator {
    let store = CaseStore::spawn(temp.path().join("cases.json")).expect("Failed to open store");
    Orchestrator::new(gateway(client), Arc::new(PromptLoader::embedded_only()), store, settings)
}

fn offline(temp: &TempDir) -> Orchestrator {
    orchestrator(Arc::new(ScriptedClient::new()), temp, PipelineConfig::default())
}

// =============================================================================
// Offline scenario
// =============================================================================

#[tokio::test]
async fn test_offline_water_scenario() {
    let temp = TempDir::new().unwrap();
    let orch = offline(&temp);

    let processed = orch.process_case(WATER, "Unknown", "Request compliance").await.unwrap();
    let case = &processed.case;

    assert_eq!(case.category, Category::LandlordTenant);
    assert!(case.draft.letter.contains(NAME_PLACEHOLDER));
    assert!(case.validation.ok);
    assert!(case.validation.missing_facts.is_empty());
    assert_eq!(case.status, CaseStatus::Drafted);
    assert_eq!(case.retries, 0);
    assert_eq!(processed.rounds(), 1);
}

#[tokio::test]
async fn test_offline_output_is_deterministic() {
    let temp_a = TempDir::new().unwrap();
    let temp_b = TempDir::new().unwrap();

    let a = offline(&temp_a).process_case(WATER, "Ohio", "Restore water").await.unwrap().case;
    let b = offline(&temp_b).process_case(WATER, "Ohio", "Restore water").await.unwrap().case;

    assert_eq!(a.category, b.category);
    assert_eq!(a.tags, b.tags);
    assert_eq!(a.summary, b.summary);
    assert_eq!(a.facts, b.facts);
    assert_eq!(a.draft, b.draft);
    assert_eq!(a.validation, b.validation);
    assert_eq!(a.retries, b.retries);
    assert_eq!(a.status, b.status);
}

#[tokio::test]
async fn test_offline_letter_keeps_multi_paragraph_facts() {
    let temp = TempDir::new().unwrap();
    let orch = offline(&temp);

    let text = "My landlord\n\nshut off the water on 3 May.";
    let processed = orch.process_case(text, "Unknown", "Request compliance").await.unwrap();
    let letter = &processed.case.draft.letter;

    assert!(letter.contains("My landlord"));
    assert!(letter.contains("shut off the water on 3 May."));
    assert!(letter.contains("What I am seeking: Request compliance."));
}

#[tokio::test]
async fn test_offline_redraft_carries_repair_marker_into_letter() {
    let temp = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new().always(
        Stage::Validate,
        r#"{"ok": false, "missing_facts": ["date"], "suggestions": []}"#,
    ));
    let orch = orchestrator(client.clone(), &temp, PipelineConfig::default());

    let processed = orch
        .process_case("My landlord\n\nshut off the water.", "Unknown", "x")
        .await
        .unwrap();

    assert_eq!(processed.case.retries, MAX_RETRIES);
    assert!(processed.case.draft.letter.contains("shut off the water."));
    assert!(processed.case.draft.letter.contains(MISSING_INFO_MARKER));
}

#[tokio::test]
async fn test_case_ids_are_unique_within_store() {
    let temp = TempDir::new().unwrap();
    let orch = offline(&temp);

    let requests = (0..25)
        .map(|i| CaseRequest::new(format!("My employer owes me wages for week {}.", i)))
        .collect();
    let results = orch.process_batch(requests, 4).await;

    let ids: HashSet<String> = results
        .into_iter()
        .map(|r| r.unwrap().case.case_id.to_string())
        .collect();
    assert_eq!(ids.len(), 25);
    assert_eq!(orch.store().count().await.unwrap(), 25);
}

// =============================================================================
// Retry controller
// =============================================================================

#[tokio::test]
async fn test_backend_without_name_exhausts_retries() {
    let temp = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new().always(
        Stage::Draft,
        "Purpose===SECTION===Dear landlord, please restore the water.===SECTION===1) Wait",
    ));
    let orch = orchestrator(client.clone(), &temp, PipelineConfig::default());

    let processed = orch.process_case(WATER, "Unknown", "Request compliance").await.unwrap();
    let case = &processed.case;

    assert_eq!(case.retries, MAX_RETRIES);
    assert!(!case.validation.ok);
    assert_eq!(case.validation.missing_facts, vec![MISSING_NAME_FACT]);
    assert_eq!(case.draft.letter, "Dear landlord, please restore the water.");
    assert_eq!(case.facts.matches(MISSING_INFO_MARKER).count(), MAX_RETRIES as usize);

    // One more marker in the facts on every redraft
    let drafts = client.prompts(Stage::Draft);
    assert_eq!(drafts.len(), 3);
    for (round, prompt) in drafts.iter().enumerate() {
        assert_eq!(prompt.matches(MISSING_INFO_MARKER).count(), round);
    }
    assert_eq!(client.calls(Stage::Validate), 3);
    assert_eq!(client.calls(Stage::Classify), 1);
}

#[tokio::test]
async fn test_missing_facts_strategy_feeds_verdict_back() {
    let temp = TempDir::new().unwrap();
    let client = Arc::new(
        ScriptedClient::new().always(
            Stage::Validate,
            r#"{"ok": false, "missing_facts": ["date of shut-off"], "suggestions": []}"#,
        ),
    );
    let settings = PipelineConfig {
        repair: RepairStrategy::MissingFacts,
        flag_exhausted: true,
        ..Default::default()
    };
    let orch = orchestrator(client.clone(), &temp, settings);

    let processed = orch.process_case(WATER, "Unknown", "Request compliance").await.unwrap();

    assert_eq!(processed.case.status, CaseStatus::NeedsReview);
    assert!(processed.case.facts.contains("Missing: date of shut-off."));
    let drafts = client.prompts(Stage::Draft);
    assert!(!drafts[0].contains("date of shut-off"));
    assert!(drafts[1].contains("date of shut-off"));
}

#[tokio::test]
async fn test_structured_pass_after_one_repair() {
    let temp = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new().on(Stage::Validate, |prompt| {
        let ok = prompt.contains(MISSING_INFO_MARKER);
        Ok(format!(r#"{{"ok": {}, "missing_facts": [], "suggestions": []}}"#, ok))
    }));
    let orch = orchestrator(client, &temp, PipelineConfig::default());

    let processed = orch.process_case(WATER, "Unknown", "x").await.unwrap();
    assert_eq!(processed.case.retries, 1);
    assert!(processed.case.validation.ok);
    assert!(processed.fallbacks.iter().all(|f| f.stage != "validate"));
}

#[tokio::test]
async fn test_slow_backend_times_out_into_fallbacks() {
    struct Slow;

    #[async_trait::async_trait]
    impl legalease::llm::LlmClient for Slow {
        async fn complete(
            &self,
            _request: legalease::llm::CompletionRequest,
        ) -> Result<legalease::llm::CompletionResponse, legalease::llm::LlmError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(legalease::llm::CompletionResponse::text("late"))
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    let temp = TempDir::new().unwrap();
    let store = CaseStore::spawn(temp.path().join("cases.json")).unwrap();
    let gateway = Gateway::new(Arc::new(Slow), Duration::from_millis(20), 1024);
    let orch = Orchestrator::new(
        gateway,
        Arc::new(PromptLoader::embedded_only()),
        store,
        PipelineConfig::default(),
    );

    let processed = orch.process_case(WATER, "Unknown", "x").await.unwrap();
    assert_eq!(processed.case.category, Category::Other);
    assert!(processed.case.draft.letter.contains(NAME_PLACEHOLDER));
    assert!(processed.case.validation.ok);
    assert_eq!(processed.fallbacks.len(), 3);
}

fn draft_script(kind: u8) -> ScriptedClient {
    match kind {
        0 => ScriptedClient::new(),
        1 => ScriptedClient::new().always(Stage::Draft, "p===SECTION===Dear Sir===SECTION===n"),
        2 => ScriptedClient::new().always(Stage::Draft, "Dear [NAME], unsectioned"),
        _ => ScriptedClient::new().failing(Stage::Draft),
    }
}

fn validate_script(client: ScriptedClient, kind: u8) -> ScriptedClient {
    match kind {
        0 => client,
        1 => client.always(Stage::Validate, r#"{"ok": false, "missing_facts": ["date"]}"#),
        2 => client.always(Stage::Validate, r#"{"ok": true}"#),
        3 => client.always(Stage::Validate, "{not json"),
        _ => client.failing(Stage::Validate),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_at_most_three_rounds(text in "\\PC{0,160}", draft in 0u8..4, verdict in 0u8..5) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let temp = TempDir::new().unwrap();
            let client = Arc::new(validate_script(draft_script(draft), verdict));
            let orch = orchestrator(client.clone(), &temp, PipelineConfig::default());

            let processed = orch.process_case(&text, "Unknown", "Request compliance").await.unwrap();

            assert!(processed.case.retries <= MAX_RETRIES);
            assert!(client.calls(Stage::Draft) <= 3);
            assert_eq!(client.calls(Stage::Draft), client.calls(Stage::Validate));
            assert_eq!(client.calls(Stage::Draft), processed.rounds() as usize);
            assert!(!processed.case.draft.letter.is_empty());
        });
    }
}

// =============================================================================
// Stage fallbacks
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_unparseable_classification_is_other(text in "\\PC{0,300}", garbage in "[^{}]{0,120}") {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let client = Arc::new(ScriptedClient::new().always(Stage::Classify, garbage.clone()));
            let classifier = Classifier::new(gateway(client), Arc::new(PromptLoader::embedded_only()));

            let outcome = classifier.classify(&text).await;
            assert!(outcome.is_degraded());
            let classification = outcome.into_value();
            assert_eq!(classification.category, Category::Other);
            assert!(classification.tags.is_empty());
            assert!(!classification.summary.is_empty());
        });
    }
}

#[tokio::test]
async fn test_validator_heuristic_on_unstructured_reply() {
    let client = Arc::new(ScriptedClient::new().always(Stage::Validate, "The letter reads well."));
    let validator = Validator::new(gateway(client), Arc::new(PromptLoader::embedded_only()));

    let with_name = validator.validate("Dear [NAME],\nPlease act.", "facts").await.into_value();
    assert!(with_name.ok);
    assert!(with_name.missing_facts.is_empty());

    let without = validator.validate("Dear Sir,\nPlease act.", "facts").await.into_value();
    assert!(!without.ok);
    assert_eq!(without.missing_facts.len(), 1);
    assert_eq!(without.missing_facts[0], MISSING_NAME_FACT);
}

// =============================================================================
// Case store and export
// =============================================================================

#[tokio::test]
async fn test_store_round_trip_survives_reopen() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("cases.json");
    let texts = [
        WATER,
        "My employer fired me without paying my final wages.",
        "The dealer will not refund a defective car.",
    ];

    let appended: Vec<String> = {
        let orch = offline(&temp);
        let mut ids = Vec::new();
        for text in texts {
            ids.push(orch.process_case(text, "Unknown", "x").await.unwrap().case.case_id.to_string());
        }
        let listed: Vec<String> = orch
            .store()
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.case_id.to_string())
            .collect();
        assert_eq!(listed, ids);
        orch.store().shutdown().await.unwrap();
        ids
    };

    let reopened = CaseStore::spawn(&path).unwrap();
    let cases = reopened.list_all().await.unwrap();
    let ids: Vec<String> = cases.iter().map(|c| c.case_id.to_string()).collect();
    assert_eq!(ids, appended);
    assert_eq!(cases[0].category, Category::LandlordTenant);

    let landlord = reopened.list_by_category(Category::LandlordTenant).await.unwrap();
    assert_eq!(landlord.len(), 1);
    let found = reopened.get(&appended[1][..4]).await.unwrap();
    assert_eq!(found.case_id.to_string(), appended[1]);
}

#[tokio::test]
async fn test_exporter_receives_every_case() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("outputs");
    let orch = offline(&temp).with_exporter(Arc::new(FileExporter::new(&out, ExportFormat::Markdown)));

    let processed = orch.process_case(WATER, "Unknown", "Request compliance").await.unwrap();
    let path = processed.export_path.expect("case should be exported");

    assert_eq!(path, out.join(format!("case_{}.md", processed.case.case_id)));
    let body = std::fs::read_to_string(&path).unwrap();
    for heading in ["# Case", "## Category", "## Facts", "## Purpose", "## Letter", "## Next steps"] {
        assert!(body.contains(heading), "missing {}", heading);
    }
}

#[tokio::test]
async fn test_export_failure_keeps_case() {
    let temp = TempDir::new().unwrap();
    // A file where the export directory should be
    let blocker = temp.path().join("outputs");
    std::fs::write(&blocker, "not a directory").unwrap();
    let orch = offline(&temp).with_exporter(Arc::new(FileExporter::new(&blocker, ExportFormat::Json)));

    let processed = orch.process_case(WATER, "Unknown", "x").await.unwrap();
    assert!(processed.export_path.is_none());
    assert_eq!(orch.store().count().await.unwrap(), 1);
}
