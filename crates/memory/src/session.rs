//! In-memory session store. Ephemeral; lives for the process lifetime.

use safina_core::context::{Interaction, SessionContext};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Default number of interactions retained per session.
pub const DEFAULT_MAX_HISTORY: usize = 10;

type History = Arc<Mutex<VecDeque<Interaction>>>;

/// Per-session conversation history with a sliding window.
///
/// The outer map lock is only held to find or create a session; reads and
/// appends on one session are serialized by that session's own mutex, so
/// traffic on different sessions never contends.
pub struct SessionStore {
    max_history: usize,
    sessions: RwLock<HashMap<String, History>>,
}

impl SessionStore {
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history: max_history.max(1),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Find the session's history, creating an empty one on first reference.
    async fn session(&self, session_id: &str) -> History {
        if let Some(history) = self.sessions.read().await.get(session_id) {
            return Arc::clone(history);
        }

        let mut sessions = self.sessions.write().await;
        Arc::clone(sessions.entry(session_id.to_string()).or_insert_with(|| {
            debug!(session_id, "Created session");
            Arc::new(Mutex::new(VecDeque::with_capacity(self.max_history)))
        }))
    }

    /// Snapshot of the session's history plus the latest account and intent.
    pub async fn get_context(&self, session_id: &str) -> SessionContext {
        let history = self.session(session_id).await;
        let snapshot: Vec<Interaction> = history.lock().await.iter().cloned().collect();
        SessionContext::from_history(session_id, snapshot)
    }

    /// Append one interaction, evicting from the front while over capacity.
    pub async fn update_context(
        &self,
        session_id: &str,
        query: &str,
        response_summary: &str,
        intent: &str,
        account_number: Option<String>,
    ) {
        let history = self.session(session_id).await;
        let mut history = history.lock().await;
        history.push_back(Interaction::new(query, response_summary, intent, account_number));
        while history.len() > self.max_history {
            history.pop_front();
        }
        debug!(session_id, len = history.len(), intent, "Session updated");
    }

    /// Number of sessions seen so far.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}
