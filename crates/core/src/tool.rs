//! Tools, handlers, and the capability registry.
//!
//! A *tool* is a capability descriptor advertised to the backend's
//! tool-selection prompt. A *handler* implements one or more tools. The
//! registry maps tool names to the handler that owns them.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::context::SessionContext;
use crate::error::ToolError;
use crate::provider::Provider;
use crate::response::Response;

/// Schema entry for one tool parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// JSON type name ("string", "integer", ...)
    #[serde(rename = "type")]
    pub kind: String,

    pub required: bool,

    pub description: String,
}

/// A capability descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Unique tool name (e.g. "check_eligibility")
    pub name: String,

    /// What the tool does (sent to the tool-selection prompt)
    pub description: String,

    /// Parameter name → schema, in declaration order
    #[serde(default)]
    pub parameters: IndexMap<String, ParamSpec>,

    /// Name of the owning handler
    pub handler: String,
}

impl ToolSpec {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: IndexMap::new(),
            handler: handler.into(),
        }
    }

    /// Declare a parameter.
    pub fn param(
        mut self,
        name: impl Into<String>,
        kind: impl Into<String>,
        required: bool,
        description: impl Into<String>,
    ) -> Self {
        self.parameters.insert(
            name.into(),
            ParamSpec {
                kind: kind.into(),
                required,
                description: description.into(),
            },
        );
        self
    }

    /// Names of the required parameters, in declaration order.
    pub fn required_params(&self) -> Vec<&str> {
        self.parameters
            .iter()
            .filter(|(_, p)| p.required)
            .map(|(n, _)| n.as_str())
            .collect()
    }
}

/// How strictly a handler's responses are checked before they leave the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    None,
    #[default]
    Light,
    Strict,
}

/// Longest message a validated response may carry.
pub const MAX_MESSAGE_CHARS: usize = 5000;

/// The core Handler trait.
///
/// Each handler (eligibility, FAQ, general fallback) implements this trait
/// and is registered in the [`CapabilityRegistry`]. The orchestrator never
/// knows which concrete handler it is calling.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Unique handler name (e.g. "digital_lending").
    fn name(&self) -> &str;

    /// Human-readable summary of the handler.
    fn description(&self) -> &str;

    /// The tools this handler implements, in declaration order.
    fn tools(&self) -> Vec<ToolSpec>;

    fn validation_level(&self) -> ValidationLevel {
        ValidationLevel::Light
    }

    /// Execute one of this handler's tools.
    ///
    /// The provider is the one already selected for this query; handlers may
    /// call it for natural-language generation.
    async fn execute(
        &self,
        tool_name: &str,
        arguments: &Map<String, Value>,
        context: &SessionContext,
        provider: &dyn Provider,
    ) -> std::result::Result<Response, ToolError>;

    /// Check a response against this handler's validation level.
    /// Returns the list of issues found (empty when valid).
    fn validate_response(&self, response: &Response) -> Vec<String> {
        let level = self.validation_level();
        if level == ValidationLevel::None {
            return Vec::new();
        }

        let mut issues = Vec::new();
        if response.message.trim().is_empty() {
            issues.push("Response message is empty".to_string());
        }
        if response.message.chars().count() > MAX_MESSAGE_CHARS {
            issues.push(format!("Response too long (>{MAX_MESSAGE_CHARS} chars)"));
        }
        if level == ValidationLevel::Strict {
            if response.confidence <= 0.0 {
                issues.push("Response confidence is zero".to_string());
            }
            if response.intent.trim().is_empty() {
                issues.push("Response intent is empty".to_string());
            }
        }
        issues
    }
}

/// Maps tool names to the handler that owns them.
///
/// Populated once at startup, then shared read-only behind an `Arc`.
pub struct CapabilityRegistry {
    /// Handlers in registration order
    handlers: IndexMap<String, Arc<dyn Handler>>,

    /// Tool name → owning handler (last registration wins)
    tools: HashMap<String, Arc<dyn Handler>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self {
            handlers: IndexMap::new(),
            tools: HashMap::new(),
        }
    }

    /// Register a handler and every tool it declares.
    ///
    /// A tool name already owned by another handler is re-pointed at this
    /// one. Re-registering a handler name replaces it in place, keeping its
    /// original position in the catalog.
    pub fn register_handler(&mut self, handler: Arc<dyn Handler>) {
        let name = handler.name().to_string();
        if self.handlers.contains_key(&name) {
            self.tools.retain(|_, owner| owner.name() != name);
        }

        let tools = handler.tools();
        for tool in &tools {
            if let Some(previous) = self.tools.insert(tool.name.clone(), Arc::clone(&handler)) {
                if previous.name() != name {
                    debug!(tool = %tool.name, previous = %previous.name(), handler = %name, "Tool owner replaced");
                }
            }
            debug!(tool = %tool.name, handler = %name, "Registered tool");
        }

        info!(handler = %name, tools = tools.len(), "Registered handler");
        self.handlers.insert(name, handler);
    }

    /// The handler owning `tool_name`, if any.
    pub fn resolve_handler(&self, tool_name: &str) -> Option<Arc<dyn Handler>> {
        self.tools.get(tool_name).cloned()
    }

    /// The full tool catalog: handler-registration order, then each
    /// handler's declaration order.
    pub fn all_tools(&self) -> Vec<ToolSpec> {
        self.handlers.values().flat_map(|h| h.tools()).collect()
    }

    /// Registered handler names, in registration order.
    pub fn handler_names(&self) -> Vec<&str> {
        self.handlers.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
