//! Project path functions - single source of truth for data file locations.
//!
//! ## Environment Variables
//!
//! - `DATA_DIR`: Override the base data directory (default: "data")
//!
//! ```bash
//! DATA_DIR=data/test PORT=3001 cargo run
//! ```

use std::env;
use std::sync::OnceLock;

/// Lazily initialized data directory from DATA_DIR env var
static DATA_DIR_VALUE: OnceLock<String> = OnceLock::new();

/// Get the base data directory (from DATA_DIR env var or default "data")
pub fn data_dir() -> &'static str {
    DATA_DIR_VALUE.get_or_init(|| env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()))
}

/// SQLite database holding users and their progress
pub fn db_path() -> String {
    format!("{}/progress.db", data_dir())
}

/// Vocabulary JSON for a built-in book
pub fn vocabulary_path(book_id: &str) -> String {
    format!("{}/vocabulary-{book_id}.json", data_dir())
}
