//! Provider trait: the abstraction over text-generation backends.
//!
//! A Provider knows how to turn a prompt into generated text. Tool selection
//! and availability checks are built on top of `generate()` by default, so a
//! concrete backend only has to implement the raw call.
//!
//! Implementations: OpenAI-compatible endpoints (Gemini, OpenAI, OpenRouter,
//! Ollama, ...), scripted mocks in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Instant;
use tracing::warn;

use crate::context::SessionContext;
use crate::error::ProviderError;
use crate::selection;
use crate::tool::ToolSpec;

/// Tool chosen when the backend gives no usable answer.
pub const DEFAULT_TOOL: &str = "answer_faq";

/// Confidence attached to the default selection.
pub const DEFAULT_SELECTION_CONFIDENCE: f32 = 0.5;

/// Confidence attached to a well-formed selection.
pub const PARSED_SELECTION_CONFIDENCE: f32 = 0.9;

/// Generation settings for the tool-selection prompt.
pub const SELECTION_MAX_TOKENS: u32 = 200;
pub const SELECTION_TEMPERATURE: f32 = 0.3;

/// Result of a liveness probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Availability {
    pub available: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl Availability {
    pub fn up(latency_ms: Option<u64>) -> Self {
        Self {
            available: true,
            error: None,
            latency_ms,
        }
    }

    pub fn down(error: impl Into<String>) -> Self {
        Self {
            available: false,
            error: Some(error.into()),
            latency_ms: None,
        }
    }
}

/// The backend's answer to "which tool should handle this query?".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSelection {
    pub tool_name: String,

    #[serde(default)]
    pub arguments: Map<String, Value>,

    pub confidence: f32,
}

impl ToolSelection {
    pub fn new(tool_name: impl Into<String>, arguments: Map<String, Value>, confidence: f32) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
            confidence,
        }
    }

    /// The fixed default: FAQ tool, no arguments, confidence 0.5.
    pub fn fallback() -> Self {
        Self::new(DEFAULT_TOOL, Map::new(), DEFAULT_SELECTION_CONFIDENCE)
    }
}

/// The core Provider trait.
///
/// Every backend implements `generate()`; the orchestrator calls
/// `select_tool()` and `check_availability()` without knowing which backend
/// is behind them.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g. "gemini").
    fn name(&self) -> &str;

    /// Generate text from a prompt.
    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> std::result::Result<String, ProviderError>;

    /// Pick a tool for the query. Never fails: any generation or parse
    /// failure yields [`ToolSelection::fallback`].
    async fn select_tool(
        &self,
        query: &str,
        context: &SessionContext,
        catalog: &[ToolSpec],
    ) -> ToolSelection {
        let prompt = selection::build_prompt(query, context, catalog);

        match self
            .generate(&prompt, SELECTION_MAX_TOKENS, SELECTION_TEMPERATURE)
            .await
        {
            Ok(text) => selection::parse_selection(&text).unwrap_or_else(|| {
                warn!(provider = %self.name(), "Malformed tool selection, using default tool");
                ToolSelection::fallback()
            }),
            Err(e) => {
                warn!(provider = %self.name(), error = %e, "Tool selection failed, using default tool");
                ToolSelection::fallback()
            }
        }
    }

    /// Probe the backend with a minimal generation.
    async fn check_availability(&self) -> Availability {
        let started = Instant::now();
        match self.generate("test", 5, 0.0).await {
            Ok(_) => Availability::up(Some(started.elapsed().as_millis() as u64)),
            Err(e) => Availability::down(e.to_string()),
        }
    }
}
