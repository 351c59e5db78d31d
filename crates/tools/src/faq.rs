//! FAQ handler. Answers policy questions grounded in a JSON knowledge base.
//!
//! The knowledge base is a JSON object of sections, each holding a `faqs`
//! array of `{question, answer}` entries:
//!
//! ```json
//! { "eligibility": { "faqs": [ { "question": "...", "answer": "..." } ] } }
//! ```

use async_trait::async_trait;
use safina_core::context::SessionContext;
use safina_core::error::{DataError, ToolError};
use safina_core::provider::Provider;
use safina_core::response::Response;
use safina_core::tool::{Handler, ToolSpec};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::HashSet;
use std::path::Path;
use tracing::{error, info, warn};

pub const HANDLER_NAME: &str = "faq";
pub const TOOL_NAME: &str = "answer_faq";
const INTENT: &str = "general_inquiry";

const MIN_SIMILARITY: f64 = 0.35;
const MAX_CLOSE_MATCHES: usize = 3;
const MIN_SHARED_WORDS: usize = 2;
const MAX_RELEVANT: usize = 5;

const ANSWER_CONFIDENCE: f32 = 0.85;
const DEGRADED_CONFIDENCE: f32 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqEntry {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

#[derive(Debug, Deserialize)]
struct Section {
    #[serde(default)]
    faqs: Vec<FaqEntry>,
}

/// Flattened FAQ entries from every section, in file order.
#[derive(Debug, Clone, Default)]
pub struct FaqBook {
    entries: Vec<FaqEntry>,
}

impl FaqBook {
    pub fn new(entries: Vec<FaqEntry>) -> Self {
        Self { entries }
    }

    /// Load from a JSON file. A missing file yields an empty book.
    pub fn from_json_file(path: &Path) -> Result<Self, DataError> {
        if !path.exists() {
            warn!(path = %path.display(), "FAQ file not found, using empty knowledge base");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|e| DataError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let book = Self::from_json_str(&raw).map_err(|e| DataError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        info!(path = %path.display(), entries = book.len(), "Loaded FAQs");
        Ok(book)
    }

    /// Parse the sectioned JSON layout. Non-object sections are skipped.
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        let sections: Map<String, Value> = serde_json::from_str(raw)?;
        let mut entries = Vec::new();
        for (_, section) in sections {
            if let Ok(section) = serde_json::from_value::<Section>(section) {
                entries.extend(section.faqs);
            }
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Up to five entries relevant to `question`.
    ///
    /// Closest questions by normalized edit similarity come first (at most
    /// three above the cutoff). When that finds fewer than two, entries
    /// sharing at least two words with the question fill the rest.
    pub fn find_relevant(&self, question: &str) -> Vec<&FaqEntry> {
        let q = question.to_lowercase();

        let mut scored: Vec<(f64, String)> = Vec::new();
        let mut seen_questions = HashSet::new();
        for entry in &self.entries {
            let candidate = entry.question.to_lowercase();
            if !seen_questions.insert(candidate.clone()) {
                continue;
            }
            let score = strsim::normalized_levenshtein(&q, &candidate);
            if score >= MIN_SIMILARITY {
                scored.push((score, candidate));
            }
        }
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(MAX_CLOSE_MATCHES);

        let mut relevant: Vec<&FaqEntry> = Vec::new();
        for (_, matched) in &scored {
            relevant.extend(
                self.entries
                    .iter()
                    .filter(|e| e.question.to_lowercase() == *matched),
            );
        }

        if relevant.len() < 2 {
            let query_words: HashSet<&str> = q.split_whitespace().collect();
            for entry in &self.entries {
                if relevant.iter().any(|r| std::ptr::eq(*r, entry)) {
                    continue;
                }
                let text = format!("{} {}", entry.question, entry.answer).to_lowercase();
                let shared = text
                    .split_whitespace()
                    .collect::<HashSet<_>>()
                    .intersection(&query_words)
                    .count();
                if shared >= MIN_SHARED_WORDS {
                    relevant.push(entry);
                    if relevant.len() >= MAX_RELEVANT {
                        break;
                    }
                }
            }
        }

        relevant.truncate(MAX_RELEVANT);
        relevant
    }
}

fn grounded_prompt(question: &str, faqs: &[&FaqEntry]) -> String {
    let context = faqs
        .iter()
        .map(|f| format!("Q: {}\nA: {}", f.question, f.answer))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are Safina, a professional banking assistant for the digital lending team.\n\n\
         Based on these FAQs from our knowledge base:\n\n\
         {context}\n\n\
         Answer this question clearly and professionally: \"{question}\"\n\n\
         Provide a helpful, accurate response based on the FAQs above. Keep it concise and actionable."
    )
}

fn general_prompt(question: &str) -> String {
    format!(
        "You are Safina, a banking assistant for the digital lending team.\n\n\
         A staff member asked: \"{question}\"\n\n\
         Based on general digital loan eligibility principles, provide a helpful answer about common requirements:\n\
         - Individual accounts (not joint)\n\
         - Sole signatory mandates\n\
         - Mobile banking enrollment\n\
         - Minimum 6 months banking history\n\
         - Good account classification (A5+ for digital, A7+ for mobile)\n\
         - No active arrears\n\
         - Regular banking activity\n\n\
         Keep the response professional, concise, and actionable."
    )
}

pub struct FaqHandler {
    book: FaqBook,
}

impl FaqHandler {
    pub fn new(book: FaqBook) -> Self {
        Self { book }
    }
}

#[async_trait]
impl Handler for FaqHandler {
    fn name(&self) -> &str {
        HANDLER_NAME
    }

    fn description(&self) -> &str {
        "Handles general inquiries about digital lending"
    }

    fn tools(&self) -> Vec<ToolSpec> {
        vec![
            ToolSpec::new(
                TOOL_NAME,
                "Answer general questions about digital lending policies, processes, and requirements",
                HANDLER_NAME,
            )
            .param("question", "string", true, "The general question to answer"),
        ]
    }

    async fn execute(
        &self,
        tool_name: &str,
        arguments: &Map<String, Value>,
        context: &SessionContext,
        provider: &dyn Provider,
    ) -> Result<Response, ToolError> {
        if tool_name != TOOL_NAME {
            return Ok(Response::error("Unknown tool requested"));
        }

        let question = arguments
            .get("question")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .unwrap_or_else(|| context.query());

        let relevant = self.book.find_relevant(question);
        info!(faq_count = relevant.len(), "Answering FAQ");

        let prompt = if relevant.is_empty() {
            general_prompt(question)
        } else {
            grounded_prompt(question, &relevant)
        };

        let (message, confidence) = match provider.generate(&prompt, 400, 0.7).await {
            Ok(text) => (text.trim().to_string(), ANSWER_CONFIDENCE),
            Err(e) => {
                error!(error = %e, "FAQ generation failed");
                (
                    "I encountered an error generating a response. Please try rephrasing your question."
                        .to_string(),
                    DEGRADED_CONFIDENCE,
                )
            }
        };

        let mut data = Map::new();
        data.insert("faq_count".into(), json!(relevant.len()));

        Ok(Response::success(message, INTENT, confidence).with_data(data))
    }
}
