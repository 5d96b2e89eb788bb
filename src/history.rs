//! Per-session conversation history windows.
//!
//! Sessions are isolated from each other: each key owns its own bounded
//! deque, so concurrent sessions never contend on one shared log. The
//! engine itself only ever reads slices handed to it; this store is the
//! single writer for a given session (callers enforce one writer per
//! session id, typically by owning the store behind their own lock).

use std::collections::{HashMap, VecDeque};
use tracing::debug;
use uuid::Uuid;

use crate::types::ConversationTurn;

/// Per-session bounded turn history.
#[derive(Debug)]
pub struct SessionStore {
    max_turns: usize,
    sessions: HashMap<String, VecDeque<ConversationTurn>>,
}

impl SessionStore {
    /// `max_turns` bounds how much history each session retains.
    pub fn new(max_turns: usize) -> Self {
        Self {
            max_turns: max_turns.max(1),
            sessions: HashMap::new(),
        }
    }

    /// Generate a fresh session id.
    pub fn new_session_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Append a turn to the session, trimming to the retention bound.
    pub fn record(&mut self, session_id: &str, turn: ConversationTurn) {
        let turns = self.sessions.entry(session_id.to_string()).or_default();
        turns.push_back(turn);
        while turns.len() > self.max_turns {
            turns.pop_front();
        }
        debug!("session {}: {} turns retained", session_id, turns.len());
    }

    /// The most recent `n` turns for the session, oldest first. Unknown
    /// sessions yield an empty window.
    pub fn recent(&self, session_id: &str, n: usize) -> Vec<ConversationTurn> {
        match self.sessions.get(session_id) {
            Some(turns) => {
                let start = turns.len().saturating_sub(n);
                turns.iter().skip(start).cloned().collect()
            }
            None => Vec::new(),
        }
    }

    /// Number of turns currently retained for the session.
    pub fn len(&self, session_id: &str) -> usize {
        self.sessions.get(session_id).map_or(0, |t| t.len())
    }

    pub fn is_empty(&self, session_id: &str) -> bool {
        self.len(session_id) == 0
    }

    /// Drop a session's history entirely.
    pub fn clear(&mut self, session_id: &str) {
        self.sessions.remove(session_id);
    }
}
