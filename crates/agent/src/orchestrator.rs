//! The query orchestrator. One pass of the pipeline per query.
//!
//! 1. **Select** a live provider (caller preference, default, fallbacks)
//! 2. **Load** the session context and attach the raw query
//! 3. **Advertise** the full tool catalog
//! 4. **Select a tool** through the provider
//! 5. **Resolve** the owning handler, or fall back to the general handler
//! 6. **Execute** the handler
//! 7. **Record** the interaction in the session store
//! 8. **Return** the response, tagged with the session id
//!
//! No error or panic escapes `process_query`; every fault becomes a
//! low-confidence `Response` with status `error`.

use futures::FutureExt;
use safina_core::context::{ACCOUNT_ARGUMENT, account_from_arguments};
use safina_core::error::ToolError;
use safina_core::provider::Provider;
use safina_core::response::{Response, Status};
use safina_core::tool::{CapabilityRegistry, Handler};
use safina_memory::SessionStore;
use safina_providers::ProviderManager;
use serde_json::{Map, Value};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Returned when no provider passes its availability check.
pub const NO_PROVIDER_MESSAGE: &str = "AI service is temporarily unavailable. Please try again.";

/// Returned when a handler fails or panics.
pub const PROCESSING_ERROR_MESSAGE: &str =
    "I encountered an error processing your request. Please try again.";

/// Substituted for an empty message on a successful response.
pub const EMPTY_MESSAGE_FALLBACK: &str =
    "I'm sorry, I couldn't produce an answer for that. Could you rephrase your question?";

const DEFAULT_FALLBACK_TOOL: &str = "general_response";

/// Routes each query through provider selection, tool selection, and handler
/// execution, recording the outcome in the session store.
pub struct Orchestrator {
    providers: Arc<ProviderManager>,
    registry: Arc<CapabilityRegistry>,
    sessions: Arc<SessionStore>,
    fallback: Arc<dyn Handler>,
    fallback_tool: String,
}

impl Orchestrator {
    /// Create an orchestrator. `fallback` handles queries whose selected tool
    /// has no registered owner; its first declared tool is used.
    pub fn new(
        providers: Arc<ProviderManager>,
        registry: Arc<CapabilityRegistry>,
        sessions: Arc<SessionStore>,
        fallback: Arc<dyn Handler>,
    ) -> Self {
        let fallback_tool = fallback
            .tools()
            .first()
            .map(|t| t.name.clone())
            .unwrap_or_else(|| DEFAULT_FALLBACK_TOOL.to_string());
        Self {
            providers,
            registry,
            sessions,
            fallback,
            fallback_tool,
        }
    }

    pub fn providers(&self) -> &ProviderManager {
        &self.providers
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Process one query. Always returns a well-formed response.
    ///
    /// A missing or blank `session_id` starts a new session with a generated id.
    pub async fn process_query(
        &self,
        query: &str,
        session_id: Option<&str>,
        provider_preference: Option<&str>,
    ) -> Response {
        let session_id = match session_id.map(str::trim).filter(|s| !s.is_empty()) {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };

        info!(session_id = %session_id, query_len = query.len(), "Processing query");

        let outcome = AssertUnwindSafe(self.dispatch(query, &session_id, provider_preference))
            .catch_unwind()
            .await;

        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                error!(session_id = %session_id, error = %e, "Handler failed");
                Response::error(PROCESSING_ERROR_MESSAGE)
            }
            Err(_) => {
                error!(session_id = %session_id, "Query pipeline panicked");
                Response::error(PROCESSING_ERROR_MESSAGE)
            }
        };

        tag(response, &session_id)
    }

    /// Step 1, then the rest of the pipeline on the chosen provider.
    async fn dispatch(
        &self,
        query: &str,
        session_id: &str,
        provider_preference: Option<&str>,
    ) -> Result<Response, ToolError> {
        let Some(provider) = self.providers.select_active(provider_preference).await else {
            warn!(session_id, "No provider available");
            return Ok(Response::error(NO_PROVIDER_MESSAGE));
        };
        self.run(query, session_id, provider.as_ref()).await
    }

    /// Steps 2-7. Errors and panics from here skip the context update.
    async fn run(
        &self,
        query: &str,
        session_id: &str,
        provider: &dyn Provider,
    ) -> Result<Response, ToolError> {
        let mut context = self.sessions.get_context(session_id).await;
        context.original_query = Some(query.to_string());

        let catalog = self.registry.all_tools();
        let selection = provider.select_tool(query, &context, &catalog).await;
        info!(
            session_id,
            provider = %provider.name(),
            tool = %selection.tool_name,
            confidence = selection.confidence,
            "Tool selected"
        );

        let (handler, tool_name, arguments) = match self.registry.resolve_handler(&selection.tool_name) {
            Some(handler) => (handler, selection.tool_name.clone(), selection.arguments.clone()),
            None => {
                warn!(tool = %selection.tool_name, fallback = %self.fallback_tool, "Unknown tool, using fallback handler");
                (Arc::clone(&self.fallback), self.fallback_tool.clone(), Map::new())
            }
        };

        let mut response = handler
            .execute(&tool_name, &arguments, &context, provider)
            .await?;

        let issues = handler.validate_response(&response);
        if !issues.is_empty() {
            warn!(handler = %handler.name(), ?issues, "Response failed validation");
            response.metadata.insert(
                "validation_issues".into(),
                Value::Array(issues.into_iter().map(Value::String).collect()),
            );
        }
        if response.status == Status::Success && response.message.trim().is_empty() {
            response.message = EMPTY_MESSAGE_FALLBACK.to_string();
        }

        self.sessions
            .update_context(
                session_id,
                query,
                &response.message,
                &response.intent,
                recorded_account(&arguments, &response),
            )
            .await;
        debug!(session_id, intent = %response.intent, status = %response.status, "Context updated");

        Ok(response
            .with_metadata("provider", provider.name())
            .with_metadata("tool", tool_name)
            .with_metadata("handler", handler.name())
            .with_metadata("selection_confidence", decimal(selection.confidence)))
    }
}

/// The account argument, else the account the handler resolved on its own
/// (for example from the session's previous turn).
fn recorded_account(arguments: &Map<String, Value>, response: &Response) -> Option<String> {
    account_from_arguments(arguments).or_else(|| {
        response
            .data_field(ACCOUNT_ARGUMENT)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
    })
}

/// Widen through the shortest decimal form so 0.9 stays 0.9 in JSON.
fn decimal(value: f32) -> f64 {
    value.to_string().parse().unwrap_or(f64::from(value))
}

fn tag(mut response: Response, session_id: &str) -> Response {
    response.session_id = Some(session_id.to_string());
    response.metadata.insert("session_id".into(), Value::String(session_id.to_string()));
    response
}
