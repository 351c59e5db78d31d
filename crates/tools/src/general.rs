//! General inquiry handler: greetings and the catch-all fallback.

use crate::time_of_day::greeting;
use async_trait::async_trait;
use chrono::{Local, Timelike};
use safina_core::context::SessionContext;
use safina_core::error::ToolError;
use safina_core::provider::Provider;
use safina_core::response::Response;
use safina_core::tool::{Handler, ToolSpec, ValidationLevel};
use serde_json::{Map, Value};
use tracing::error;

pub const HANDLER_NAME: &str = "general_inquiry";
pub const TOOL_NAME: &str = "general_response";

const GREETING_WORDS: &[&str] = &["hi", "hello", "hey"];
const GREETING_PHRASES: &[[&str; 2]] = &[
    ["good", "morning"],
    ["good", "afternoon"],
    ["good", "evening"],
];

/// Word-level greeting detection: "hi there" matches, "this" does not.
pub fn is_greeting(query: &str) -> bool {
    let lowered = query.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    words.iter().any(|w| GREETING_WORDS.contains(w))
        || words
            .windows(2)
            .any(|pair| GREETING_PHRASES.iter().any(|p| p[..] == *pair))
}

fn greeting_response(hour: u32) -> Response {
    let message = format!(
        "{}!\n\n\
         I'm Safina, your AI assistant for digital lending queries.\n\n\
         I can help you with:\n\
         • Checking customer loan eligibility\n\
         • Explaining ineligibility reasons\n\
         • Answering questions about digital lending policies\n\
         • Providing guidance on loan processes\n\n\
         How can I assist you today?",
        greeting(hour)
    );

    Response::success(message, "greeting", 0.95).with_suggestions([
        "Check eligibility for account 503446",
        "What are the eligibility requirements?",
        "How does the digital loan process work?",
    ])
}

fn general_prompt(query: &str) -> String {
    format!(
        "You are Safina, a professional banking assistant for the digital lending team.\n\n\
         A staff member asked: \"{query}\"\n\n\
         Provide a helpful, professional response. If it's about loan eligibility:\n\
         - Remind them they need an account number to check specific eligibility\n\
         - Mention general eligibility criteria (individual account, sole signatory, mobile banking, 6+ months history)\n\n\
         If it's a general question about digital loans, provide accurate information about the digital lending services.\n\n\
         Keep the response concise, professional, and actionable."
    )
}

/// Fallback handler; the orchestrator routes here when no tool resolves.
pub struct GeneralHandler;

#[async_trait]
impl Handler for GeneralHandler {
    fn name(&self) -> &str {
        HANDLER_NAME
    }

    fn description(&self) -> &str {
        "Handles general inquiries and fallback cases"
    }

    fn tools(&self) -> Vec<ToolSpec> {
        vec![ToolSpec::new(
            TOOL_NAME,
            "Handle greetings, general questions, and fallback cases",
            HANDLER_NAME,
        )]
    }

    fn validation_level(&self) -> ValidationLevel {
        ValidationLevel::None
    }

    async fn execute(
        &self,
        tool_name: &str,
        _arguments: &Map<String, Value>,
        context: &SessionContext,
        provider: &dyn Provider,
    ) -> Result<Response, ToolError> {
        if tool_name != TOOL_NAME {
            return Ok(Response::error("Unknown tool requested"));
        }

        let query = context.query();
        if is_greeting(query) {
            return Ok(greeting_response(Local::now().hour()));
        }

        let response = match provider.generate(&general_prompt(query), 300, 0.7).await {
            Ok(text) => Response::success(text.trim(), "general_inquiry", 0.75),
            Err(e) => {
                error!(error = %e, "General response generation failed");
                Response::success(
                    "I'm here to help with digital lending queries. Please ask about loan eligibility, requirements, or processes.",
                    "general_inquiry",
                    0.6,
                )
            }
        };
        Ok(response)
    }
}
