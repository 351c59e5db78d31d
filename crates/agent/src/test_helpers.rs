//! Shared test helpers for orchestrator tests.

use crate::orchestrator::Orchestrator;
use safina_core::context::SessionContext;
use safina_core::error::{ProviderError, ToolError};
use safina_core::provider::{Availability, Provider};
use safina_core::response::Response;
use safina_core::tool::{CapabilityRegistry, Handler, ToolSpec};
use safina_memory::SessionStore;
use safina_providers::ProviderManager;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};

/// A mock provider that returns a sequence of scripted replies.
///
/// Availability is fixed at construction and never consumes a reply.
pub struct ScriptedProvider {
    available: bool,
    replies: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn available_with(replies: Vec<&str>) -> Arc<Self> {
        Arc::new(Self {
            available: true,
            replies: Mutex::new(replies.into_iter().rev().map(String::from).collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            available: false,
            replies: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// Prompts that asked for a tool selection, oldest first.
    pub fn selection_prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.contains("User Query:"))
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str, _: u32, _: f32) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| ProviderError::Generation("script exhausted".into()))
    }

    async fn check_availability(&self) -> Availability {
        if self.available {
            Availability::up(Some(1))
        } else {
            Availability::down("scripted outage")
        }
    }
}

/// Panics inside its availability check.
pub struct PanickingHealthProvider;

#[async_trait::async_trait]
impl Provider for PanickingHealthProvider {
    fn name(&self) -> &str {
        "panicky"
    }

    async fn generate(&self, _: &str, _: u32, _: f32) -> Result<String, ProviderError> {
        Err(ProviderError::Generation("never called".into()))
    }

    async fn check_availability(&self) -> Availability {
        panic!("health check blew up");
    }
}

/// Replies with the query text; intent is the tool name. Like the
/// eligibility handler, it reports the session's last account in `data`.
pub struct EchoHandler {
    name: String,
    tool: String,
    silent: bool,
}

impl EchoHandler {
    pub fn arc(name: &str, tool: &str) -> Arc<dyn Handler> {
        Arc::new(Self {
            name: name.into(),
            tool: tool.into(),
            silent: false,
        })
    }

    /// Handler "silent" with tool "silent" that replies with an empty message.
    pub fn silent() -> Arc<dyn Handler> {
        Arc::new(Self {
            name: "silent".into(),
            tool: "silent".into(),
            silent: true,
        })
    }
}

#[async_trait::async_trait]
impl Handler for EchoHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Echoes the query"
    }

    fn tools(&self) -> Vec<ToolSpec> {
        vec![ToolSpec::new(&self.tool, "Echo the query back", &self.name)]
    }

    async fn execute(
        &self,
        tool_name: &str,
        _arguments: &Map<String, Value>,
        context: &SessionContext,
        _provider: &dyn Provider,
    ) -> Result<Response, ToolError> {
        let message = if self.silent {
            String::new()
        } else {
            format!("echo: {}", context.query())
        };
        let mut response = Response::success(message, tool_name, 0.9);
        if let Some(account) = &context.last_account {
            let mut data = Map::new();
            data.insert("account_number".into(), Value::String(account.clone()));
            response = response.with_data(data);
        }
        Ok(response)
    }
}

/// Panics on every execution. Owns tool "boom".
pub struct PanickingHandler;

#[async_trait::async_trait]
impl Handler for PanickingHandler {
    fn name(&self) -> &str {
        "panicking"
    }

    fn description(&self) -> &str {
        "Always panics"
    }

    fn tools(&self) -> Vec<ToolSpec> {
        vec![ToolSpec::new("boom", "Panic", "panicking")]
    }

    async fn execute(
        &self,
        _: &str,
        _: &Map<String, Value>,
        _: &SessionContext,
        _: &dyn Provider,
    ) -> Result<Response, ToolError> {
        panic!("handler blew up");
    }
}

/// Returns an error on every execution. Owns tool "fail".
pub struct FailingHandler;

#[async_trait::async_trait]
impl Handler for FailingHandler {
    fn name(&self) -> &str {
        "failing"
    }

    fn description(&self) -> &str {
        "Always fails"
    }

    fn tools(&self) -> Vec<ToolSpec> {
        vec![ToolSpec::new("fail", "Fail", "failing")]
    }

    async fn execute(
        &self,
        tool_name: &str,
        _: &Map<String, Value>,
        _: &SessionContext,
        _: &dyn Provider,
    ) -> Result<Response, ToolError> {
        Err(ToolError::ExecutionFailed {
            tool_name: tool_name.into(),
            reason: "scripted failure".into(),
        })
    }
}

/// An orchestrator over one provider (registered as default "scripted") and
/// the given handlers. The fallback is an echo handler named "fallback".
pub fn orchestrator_with(
    provider: Arc<ScriptedProvider>,
    handlers: Vec<Arc<dyn Handler>>,
) -> Orchestrator {
    orchestrator_over("scripted", provider, handlers)
}

/// Same as [`orchestrator_with`] for any provider, registered as `name`.
pub fn orchestrator_over(
    name: &str,
    provider: Arc<dyn Provider>,
    handlers: Vec<Arc<dyn Handler>>,
) -> Orchestrator {
    let mut manager = ProviderManager::new();
    manager.register(name, provider);
    manager.set_default(name).unwrap();

    let mut registry = CapabilityRegistry::new();
    for handler in handlers {
        registry.register_handler(handler);
    }

    Orchestrator::new(
        Arc::new(manager),
        Arc::new(registry),
        Arc::new(SessionStore::new(10)),
        EchoHandler::arc("fallback", "fallback_tool"),
    )
}
