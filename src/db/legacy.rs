//! Import of the legacy `users.json` store.
//!
//! The old format is `{ "users": [ { username, passwordHash, chapterProgress,
//! vocabProgress: { latin: { correctCount, incorrectCount } } } ] }`. Some
//! files were migrated to name the pointer `stageProgress`; both are accepted.

use rusqlite::Connection;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::users::{user_exists, write_user};
use crate::domain::{ProgressEntry, User};
use crate::error::{Error, Result};

#[derive(Debug, Deserialize)]
struct LegacyFile {
    users: Vec<LegacyUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyUser {
    username: String,
    #[serde(alias = "stageProgress")]
    chapter_progress: Option<i64>,
    #[serde(default)]
    vocab_progress: BTreeMap<String, ProgressEntry>,
}

impl From<LegacyUser> for User {
    fn from(legacy: LegacyUser) -> Self {
        User {
            username: legacy.username,
            chapter_progress: legacy.chapter_progress.unwrap_or(1).max(1),
            vocab_progress: legacy.vocab_progress,
        }
    }
}

/// Import users missing from the database. Existing users are left untouched.
/// Returns the number of users imported.
pub fn import_legacy_users(conn: &mut Connection, path: &Path) -> Result<usize> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        Error::data_unavailable(format!("Failed to read {}: {}", path.display(), e))
    })?;
    import_legacy_json(conn, &contents)
}

fn import_legacy_json(conn: &mut Connection, contents: &str) -> Result<usize> {
    let file: LegacyFile = serde_json::from_str(contents)
        .map_err(|e| Error::data_unavailable(format!("Invalid legacy users file: {}", e)))?;

    let tx = conn.transaction()?;
    let mut imported = 0;
    for legacy in file.users {
        if legacy.username.trim().is_empty() {
            tracing::warn!("Skipping legacy user with empty username");
            continue;
        }
        if user_exists(&tx, &legacy.username)? {
            tracing::debug!("Legacy user {} already present, skipping", legacy.username);
            continue;
        }
        write_user(&tx, &User::from(legacy))?;
        imported += 1;
    }
    tx.commit()?;

    tracing::info!("Imported {} legacy users", imported);
    Ok(imported)
}
