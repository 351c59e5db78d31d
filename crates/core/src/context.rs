//! Session context: the conversation history handed to every pipeline step.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Tool argument naming the account an interaction concerns.
pub const ACCOUNT_ARGUMENT: &str = "account_number";

/// Read the account argument, accepting strings or numbers. Blank is `None`.
pub fn account_from_arguments(arguments: &Map<String, Value>) -> Option<String> {
    let value = match arguments.get(ACCOUNT_ARGUMENT)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!value.is_empty()).then_some(value)
}

/// One completed query/response exchange. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    /// When the interaction was recorded
    pub timestamp: DateTime<Utc>,

    /// The raw query text
    pub query: String,

    /// Summary of the response (the response message)
    pub response: String,

    /// The resolved intent label
    pub intent: String,

    /// Account identifier extracted from the tool arguments, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
}

impl Interaction {
    pub fn new(
        query: impl Into<String>,
        response: impl Into<String>,
        intent: impl Into<String>,
        account_number: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            query: query.into(),
            response: response.into(),
            intent: intent.into(),
            account_number,
        }
    }
}

/// A snapshot of one session's history plus derived convenience fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: String,

    /// Interactions, oldest first
    pub history: Vec<Interaction>,

    /// Account identifier of the most recent interaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_account: Option<String>,

    /// Intent of the most recent interaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_intent: Option<String>,

    /// The raw query currently being processed. Set by the orchestrator;
    /// fallback handlers read it when the tool arguments carry nothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_query: Option<String>,
}

impl SessionContext {
    /// Build a context from a session's history.
    pub fn from_history(session_id: impl Into<String>, history: Vec<Interaction>) -> Self {
        let last = history.last();
        let last_account = last.and_then(|i| i.account_number.clone());
        let last_intent = last.map(|i| i.intent.clone());
        Self {
            session_id: session_id.into(),
            history,
            last_account,
            last_intent,
            original_query: None,
        }
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// The query being processed, or an empty string.
    pub fn query(&self) -> &str {
        self.original_query.as_deref().unwrap_or("")
    }
}
