//! Application configuration.
//!
//! Values are loaded with priority: config.toml > environment (.env) > default.
//! The learning thresholds mirror the tuning knobs of the quiz engine and are
//! all overridable from the `[learning]` table.

use serde::Deserialize;
use std::path::PathBuf;

use crate::paths;

// ==================== Server Configuration ====================

/// Server address to bind to
pub const SERVER_ADDR: &str = "0.0.0.0";

/// Default server port
pub const SERVER_PORT: u16 = 3000;

/// Book used when a request does not name one
pub const DEFAULT_BOOK: &str = "bk1";

// ==================== Question Configuration ====================

/// Number of options in a multiple-choice question (correct answer included)
pub const OPTION_COUNT: usize = 4;

/// Placeholder that replaces the answer in fill-in-the-blank sentences
pub const CLOZE_BLANK: &str = "___________";

// ==================== Learning Configuration ====================

/// Tuning knobs for word selection and grading
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Correct answers needed before a word counts as mastered
    pub master_threshold: u32,
    /// Minimum accuracy for a word to count as mastered
    pub master_accuracy_threshold: f64,
    /// Error rate above which a word is "weak"
    pub weak_word_threshold: f64,
    /// Length of the recently-served word history
    pub recent_words_max_count: usize,
    /// Skip mastery filtering when it would remove at least this share of a pool
    pub mastery_starvation_ratio: f64,
    /// Walk pools in book order instead of picking at random
    pub sequential_order: bool,
    /// Minimum length of a fill-in-the-blank answer eligible for partial credit
    pub partial_min_chars: usize,
    /// Share of the correct form a partial answer must cover (inclusive)
    pub partial_match_ratio: f64,
    /// Multiple-choice answers must match case exactly
    pub choice_case_sensitive: bool,
    /// Drop idle in-memory sessions after this many hours (never when unset)
    pub session_expiry_hours: Option<i64>,
    /// Fixed seed for the question random source (OS entropy when unset)
    pub rng_seed: Option<u64>,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            master_threshold: 3,
            master_accuracy_threshold: 0.75,
            weak_word_threshold: 0.3,
            recent_words_max_count: 10,
            mastery_starvation_ratio: 0.9,
            sequential_order: true,
            partial_min_chars: 3,
            partial_match_ratio: 0.8,
            choice_case_sensitive: true,
            session_expiry_hours: None,
            rng_seed: None,
        }
    }
}

/// A vocabulary book available to the quiz
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BookConfig {
    pub id: String,
    pub title: String,
    pub path: PathBuf,
}

/// Built-in books, resolved under the data directory
pub fn default_books() -> Vec<BookConfig> {
    vec![
        BookConfig {
            id: "bk1".to_string(),
            title: "Cambridge Latin Course Book 1".to_string(),
            path: PathBuf::from(paths::vocabulary_path("bk1")),
        },
        BookConfig {
            id: "bk2".to_string(),
            title: "Cambridge Latin Course Book 2".to_string(),
            path: PathBuf::from(paths::vocabulary_path("bk2")),
        },
    ]
}

// ==================== config.toml ====================

/// Configuration file structure for config.toml
#[derive(Debug, Default, Deserialize)]
struct AppConfig {
    database: Option<DatabaseConfig>,
    server: Option<ServerConfig>,
    learning: Option<LearningConfig>,
    books: Option<Vec<BookConfig>>,
    legacy: Option<LegacyConfig>,
}

#[derive(Debug, Deserialize)]
struct DatabaseConfig {
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServerConfig {
    port: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct LegacyConfig {
    users_file: Option<String>,
}

/// Fully resolved runtime settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_path: PathBuf,
    pub port: u16,
    pub learning: LearningConfig,
    pub books: Vec<BookConfig>,
    pub legacy_users_file: Option<PathBuf>,
}

impl Settings {
    /// Full server bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", SERVER_ADDR, self.port)
    }
}

/// Load settings from config.toml, the environment and defaults
pub fn load_settings() -> Settings {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let file_config = match std::fs::read_to_string("config.toml") {
        Ok(contents) => parse_config(&contents),
        Err(_) => AppConfig::default(),
    };

    resolve(file_config, |key| std::env::var(key).ok())
}

fn parse_config(contents: &str) -> AppConfig {
    match toml::from_str::<AppConfig>(contents) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Ignoring invalid config.toml: {}", e);
            AppConfig::default()
        }
    }
}

fn resolve(file_config: AppConfig, env: impl Fn(&str) -> Option<String>) -> Settings {
    let database_path = if let Some(path) = file_config.database.and_then(|db| db.path) {
        tracing::info!("Using database from config.toml: {}", path);
        PathBuf::from(path)
    } else if let Some(path) = env("DATABASE_PATH") {
        tracing::info!("Using database from DATABASE_PATH env: {}", path);
        PathBuf::from(path)
    } else {
        let default = PathBuf::from(paths::db_path());
        tracing::info!("Using default database path: {}", default.display());
        default
    };

    let port = file_config
        .server
        .and_then(|s| s.port)
        .or_else(|| env("PORT").and_then(|p| p.parse().ok()))
        .unwrap_or(SERVER_PORT);

    let legacy_users_file = file_config
        .legacy
        .and_then(|l| l.users_file)
        .or_else(|| env("LEGACY_USERS_FILE"))
        .map(PathBuf::from);

    Settings {
        database_path,
        port,
        learning: file_config.learning.unwrap_or_default(),
        books: file_config.books.unwrap_or_else(default_books),
        legacy_users_file,
    }
}
