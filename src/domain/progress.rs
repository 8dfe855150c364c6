use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-word answer counts for one user. Counts only ever grow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
    pub correct_count: u32,
    pub incorrect_count: u32,
}

impl ProgressEntry {
    pub fn new(correct_count: u32, incorrect_count: u32) -> Self {
        Self {
            correct_count,
            incorrect_count,
        }
    }

    pub fn total(&self) -> u32 {
        self.correct_count + self.incorrect_count
    }

    /// Share of correct answers, 0.0 when never answered
    pub fn accuracy(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.correct_count as f64 / total as f64,
        }
    }

    /// Share of incorrect answers, 0.0 when never answered
    pub fn error_rate(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.incorrect_count as f64 / total as f64,
        }
    }

    pub fn record(&mut self, is_correct: bool) {
        if is_correct {
            self.correct_count += 1;
        } else {
            self.incorrect_count += 1;
        }
    }
}

/// Persistent user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    /// 1-based pointer to the user's current chapter
    pub chapter_progress: i64,
    pub vocab_progress: BTreeMap<String, ProgressEntry>,
}

impl User {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            chapter_progress: 1,
            vocab_progress: BTreeMap::new(),
        }
    }

    pub fn progress_for(&self, latin: &str) -> Option<&ProgressEntry> {
        self.vocab_progress.get(latin)
    }
}
