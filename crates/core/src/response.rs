//! The structured response returned by every handler and by the pipeline itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outcome class of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    Error,
    MissingData,
    NotFound,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::Error => "error",
            Status::MissingData => "missing_data",
            Status::NotFound => "not_found",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pipeline response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub message: String,

    /// Resolved intent label (e.g. "eligibility_check", "greeting")
    pub intent: String,

    /// Confidence in [0, 1]
    pub confidence: f32,

    pub status: Status,

    /// Structured payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,

    /// Follow-up suggestions for the user
    #[serde(default)]
    pub suggestions: Vec<String>,

    #[serde(default)]
    pub metadata: Map<String, Value>,

    /// Session the response belongs to (attached by the orchestrator)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    pub timestamp: DateTime<Utc>,
}

impl Response {
    /// Create a response. Confidence is clamped to [0, 1].
    pub fn new(
        message: impl Into<String>,
        intent: impl Into<String>,
        confidence: f32,
        status: Status,
    ) -> Self {
        Self {
            message: message.into(),
            intent: intent.into(),
            confidence: clamp_confidence(confidence),
            status,
            data: None,
            suggestions: Vec::new(),
            metadata: Map::new(),
            session_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn success(message: impl Into<String>, intent: impl Into<String>, confidence: f32) -> Self {
        Self::new(message, intent, confidence, Status::Success)
    }

    /// A zero-confidence error response with intent "error".
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, "error", 0.0, Status::Error)
    }

    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_suggestions<I, S>(mut self, suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suggestions = suggestions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Look up a field in the data payload.
    pub fn data_field(&self, key: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|d| d.get(key))
    }
}

fn clamp_confidence(confidence: f32) -> f32 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}
