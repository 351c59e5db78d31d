//! End-to-end tests for the Safina query pipeline.
//!
//! Builds the real handlers over CSV and JSON data in a temp directory and
//! drives them through the orchestrator with a scripted provider.

use std::path::Path;
use std::sync::{Arc, Mutex};

use safina_agent::Orchestrator;
use safina_core::error::ProviderError;
use safina_core::provider::{Availability, Provider};
use safina_core::response::Status;
use safina_memory::SessionStore;
use safina_providers::ProviderManager;
use safina_tools::{FaqBook, TableLookup, default_registry, fallback_handler};
use serde_json::json;

// ── Mock Provider ────────────────────────────────────────────────────────

/// Returns scripted replies in order; availability is fixed.
struct ScriptedProvider {
    name: String,
    available: bool,
    replies: Mutex<Vec<String>>,
    calls: Mutex<usize>,
}

impl ScriptedProvider {
    fn new(name: &str, replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            available: true,
            replies: Mutex::new(replies.iter().rev().map(|s| s.to_string()).collect()),
            calls: Mutex::new(0),
        })
    }

    fn down(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            available: false,
            replies: Mutex::new(Vec::new()),
            calls: Mutex::new(0),
        })
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, _prompt: &str, _: u32, _: f32) -> Result<String, ProviderError> {
        *self.calls.lock().unwrap() += 1;
        self.replies
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| ProviderError::Generation("script exhausted".into()))
    }

    async fn check_availability(&self) -> Availability {
        if self.available {
            Availability::up(Some(5))
        } else {
            Availability::down("offline")
        }
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────

const WAREHOUSE: &str = "ACCOUNT_NUMBER,CUS_NAME_1\n5034460001,Peter Otieno\n";
const REASONS: &str = "CUSTOMERNO,ACCOUNT_NUMBER,CUS_NAME_1,recency_check,Joint_Check,Mandates_Check\n\
                       612345,6123450001,Jane Wanjiru,N,EXCLUDE,INCLUDE\n";
const FAQS: &str = r#"{"eligibility": {"faqs": [
    {"question": "What are the eligibility requirements?", "answer": "Individual account and six months history."}
]}}"#;

fn write_data(dir: &Path) {
    std::fs::write(dir.join("warehouse.csv"), WAREHOUSE).unwrap();
    std::fs::write(dir.join("reasons.csv"), REASONS).unwrap();
    std::fs::write(dir.join("faqs.json"), FAQS).unwrap();
}

fn orchestrator(dir: &Path, providers: Vec<Arc<ScriptedProvider>>) -> Orchestrator {
    write_data(dir);
    let lookup =
        TableLookup::from_csv_files(&dir.join("warehouse.csv"), &dir.join("reasons.csv")).unwrap();
    let faqs = FaqBook::from_json_file(&dir.join("faqs.json")).unwrap();

    let mut manager = ProviderManager::new();
    let names: Vec<String> = providers.iter().map(|p| p.name.clone()).collect();
    for p in providers {
        let name = p.name.clone();
        manager.register(name, p);
    }
    if let Some(first) = names.first() {
        manager.set_default(first).unwrap();
    }
    manager.set_fallback_order(names.into_iter().skip(1).collect());

    Orchestrator::new(
        Arc::new(manager),
        Arc::new(default_registry(Arc::new(lookup), faqs)),
        Arc::new(SessionStore::new(10)),
        fallback_handler(),
    )
}

// ── Tests ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn eligible_account_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(
        "gemini",
        &[r#"```json
{"tool_name": "check_eligibility", "arguments": {"account_number": "503446"}, "confidence": 0.9}
```"#],
    );
    let orch = orchestrator(dir.path(), vec![provider.clone()]);

    let r = orch
        .process_query("Check eligibility for account 503446", Some("e2e"), None)
        .await;

    assert_eq!(r.status, Status::Success);
    assert_eq!(r.intent, "eligibility_check");
    assert_eq!(r.data_field("is_eligible"), Some(&json!(true)));
    assert_eq!(r.data_field("account_number"), Some(&json!("5034460001")));
    assert_eq!(r.session_id.as_deref(), Some("e2e"));
    assert_eq!(r.metadata["handler"], json!("digital_lending"));
    // Only the selection call; the eligibility check itself is deterministic.
    assert_eq!(provider.calls(), 1);

    let ctx = orch.sessions().get_context("e2e").await;
    assert_eq!(ctx.history_len(), 1);
    assert_eq!(ctx.last_account.as_deref(), Some("503446"));
}

#[tokio::test]
async fn ineligible_account_explains_failures() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(
        "gemini",
        &[r#"{"tool_name": "check_eligibility", "arguments": {"account_number": "612345"}}"#],
    );
    let orch = orchestrator(dir.path(), vec![provider]);

    let r = orch.process_query("is 612345 eligible?", None, None).await;
    assert_eq!(r.data_field("is_eligible"), Some(&json!(false)));
    let checks: Vec<&str> = r.data_field("failed_checks").unwrap().as_array().unwrap()
        .iter()
        .map(|c| c["check_type"].as_str().unwrap())
        .collect();
    assert_eq!(checks, ["recency_check", "Joint_Check"]);
    assert!(!r.data_field("action_items").unwrap().as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_account_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(
        "gemini",
        &[r#"{"tool_name": "check_eligibility", "arguments": {"account_number": "9999999999"}}"#],
    );
    let orch = orchestrator(dir.path(), vec![provider]);

    let r = orch.process_query("check 9999999999", Some("s"), None).await;
    assert_eq!(r.status, Status::NotFound);
    assert_eq!(r.intent, "eligibility_check");
    assert!(r.message.contains("9999999999"));
}

#[tokio::test]
async fn follow_up_reuses_session_account() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(
        "gemini",
        &[
            r#"{"tool_name": "check_eligibility", "arguments": {"account_number": "503446"}}"#,
            r#"{"tool_name": "check_eligibility", "arguments": {}}"#,
            r#"{"tool_name": "check_eligibility", "arguments": {}}"#,
        ],
    );
    let orch = orchestrator(dir.path(), vec![provider]);

    orch.process_query("check 503446", Some("s"), None).await;
    let r = orch.process_query("and again?", Some("s"), None).await;
    assert_eq!(r.data_field("is_eligible"), Some(&json!(true)));

    let ctx = orch.sessions().get_context("s").await;
    assert_eq!(ctx.history_len(), 2);
    assert_eq!(ctx.last_account.as_deref(), Some("5034460001"));

    let r = orch.process_query("one more time?", Some("s"), None).await;
    assert_eq!(r.status, Status::Success);
    assert_eq!(r.data_field("is_eligible"), Some(&json!(true)));
}

#[tokio::test]
async fn no_provider_returns_error_without_history() {
    let dir = tempfile::tempdir().unwrap();
    let orch = orchestrator(dir.path(), vec![ScriptedProvider::down("gemini")]);

    let r = orch.process_query("hello", Some("s"), None).await;
    assert_eq!(r.status, Status::Error);
    assert_eq!(r.intent, "error");
    assert_eq!(r.confidence, 0.0);
    assert_eq!(r.session_id.as_deref(), Some("s"));
    assert_eq!(orch.sessions().get_context("s").await.history_len(), 0);
}

#[tokio::test]
async fn unavailable_default_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let backup = ScriptedProvider::new("ollama", &[r#"{"tool_name": "general_response"}"#]);
    let orch = orchestrator(dir.path(), vec![ScriptedProvider::down("gemini"), backup]);

    let r = orch.process_query("hi there", Some("s"), None).await;
    assert_eq!(r.intent, "greeting");
    assert_eq!(r.metadata["provider"], json!("ollama"));
}

#[tokio::test]
async fn unknown_tool_uses_general_handler() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(
        "gemini",
        &[r#"{"tool_name": "nonexistent_tool"}"#, "Digital loans go to the mobile wallet."],
    );
    let orch = orchestrator(dir.path(), vec![provider.clone()]);

    let r = orch.process_query("where does the money go", Some("s"), None).await;
    assert_eq!(r.status, Status::Success);
    assert_eq!(r.intent, "general_inquiry");
    assert_eq!(r.message, "Digital loans go to the mobile wallet.");
    assert_eq!(r.metadata["tool"], json!("general_response"));
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn faq_question_is_grounded() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new(
        "gemini",
        &[
            r#"{"tool_name": "answer_faq", "arguments": {"question": "What are the eligibility requirements?"}}"#,
            "An individual account with six months of history.",
        ],
    );
    let orch = orchestrator(dir.path(), vec![provider]);

    let r = orch
        .process_query("What are the eligibility requirements?", None, None)
        .await;
    assert_eq!(r.intent, "general_inquiry");
    assert_eq!(r.confidence, 0.85);
    assert_eq!(r.data_field("faq_count"), Some(&json!(1)));
}
