//! Per-user ephemeral practice state.
//!
//! Sessions are keyed by username, created lazily and kept in process memory
//! only: a restart forgets recent history and pending retries. Progress counts
//! live in the progress store and are unaffected.

use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

/// Recently served words, pending retries and the sequential cursor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Latin forms served most recently, oldest first
    pub word_history: VecDeque<String>,
    /// Words answered incorrectly and not yet retried
    pub incorrect_words: HashSet<String>,
    /// Pool the cursor belongs to
    pub last_pool_key: Option<String>,
    /// Latin form of the last sequentially served word in that pool
    pub pool_cursor: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to history, evicting the oldest entries beyond `cap`
    pub fn record_served(&mut self, latin: &str, cap: usize) {
        self.word_history.push_back(latin.to_string());
        while self.word_history.len() > cap {
            self.word_history.pop_front();
        }
    }

    pub fn was_recently_served(&self, latin: &str) -> bool {
        self.word_history.iter().any(|w| w == latin)
    }

    pub fn clear_history(&mut self) {
        self.word_history.clear();
    }

    /// Queue a word for retry after a wrong answer
    pub fn mark_incorrect(&mut self, latin: &str) {
        self.incorrect_words.insert(latin.to_string());
    }

    /// Drop a word from the retry set (answered correctly or retried)
    pub fn clear_incorrect(&mut self, latin: &str) -> bool {
        self.incorrect_words.remove(latin)
    }

    pub fn is_pending_retry(&self, latin: &str) -> bool {
        self.incorrect_words.contains(latin)
    }

    /// Last sequentially served word for `pool_key`, if the last pick came from it
    pub fn cursor_for(&self, pool_key: &str) -> Option<&str> {
        match &self.last_pool_key {
            Some(key) if key == pool_key => self.pool_cursor.as_deref(),
            _ => None,
        }
    }

    pub fn set_cursor(&mut self, pool_key: &str, latin: &str) {
        self.last_pool_key = Some(pool_key.to_string());
        self.pool_cursor = Some(latin.to_string());
    }
}

/// Keyed store of session state.
///
/// Callers serialize access per username; implementations only need to make
/// individual loads and stores safe.
pub trait SessionTracker: Send + Sync {
    /// Current state for a user, or a fresh one
    fn load(&self, username: &str) -> SessionState;

    fn store(&self, username: &str, state: SessionState);
}

struct SessionEntry {
    state: SessionState,
    last_access: DateTime<Utc>,
}

/// In-process session tracker
pub struct MemorySessionTracker {
    sessions: Mutex<HashMap<String, SessionEntry>>,
    expiry: Option<Duration>,
}

impl MemorySessionTracker {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            expiry: None,
        }
    }

    /// Drop sessions idle for longer than `hours`
    pub fn with_expiry_hours(hours: i64) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            expiry: Some(Duration::hours(hours)),
        }
    }

    fn cleanup_expired(&self, sessions: &mut HashMap<String, SessionEntry>, now: DateTime<Utc>) {
        if let Some(expiry) = self.expiry {
            let before = sessions.len();
            sessions.retain(|_, entry| now - entry.last_access < expiry);
            let removed = before - sessions.len();
            if removed > 0 {
                tracing::debug!("Expired {} idle sessions", removed);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn load_at(&self, username: &str, now: DateTime<Utc>) -> SessionState {
        // A poisoned map only loses ephemeral state; recover the inner value
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        self.cleanup_expired(&mut sessions, now);

        match sessions.get_mut(username) {
            Some(entry) => {
                entry.last_access = now;
                entry.state.clone()
            }
            None => SessionState::new(),
        }
    }

    fn store_at(&self, username: &str, state: SessionState, now: DateTime<Utc>) {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.insert(
            username.to_string(),
            SessionEntry {
                state,
                last_access: now,
            },
        );
    }
}

impl Default for MemorySessionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionTracker for MemorySessionTracker {
    fn load(&self, username: &str) -> SessionState {
        self.load_at(username, Utc::now())
    }

    fn store(&self, username: &str, state: SessionState) {
        self.store_at(username, state, Utc::now())
    }
}
