//! User records and per-word progress counts.
//!
//! Free functions operate on a borrowed connection (so they compose inside a
//! caller's transaction); [`SqliteProgressStore`] wraps them behind the
//! [`ProgressStore`] trait used by the quiz service.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;

use super::{try_lock, DbPool};
use crate::domain::{ProgressEntry, User};
use crate::error::{Error, Result};

/// Durable per-user mastery statistics.
pub trait ProgressStore: Send + Sync {
    fn get_user(&self, username: &str) -> Result<Option<User>>;

    /// Write the full user record, replacing any stored progress
    fn upsert_user(&self, user: &User) -> Result<()>;

    /// Atomically bump one counter for a word and return the new totals.
    /// Fails with `NotFound` if the user does not exist.
    fn record_answer(&self, username: &str, latin: &str, is_correct: bool) -> Result<ProgressEntry>;
}

pub fn get_user(conn: &Connection, username: &str) -> rusqlite::Result<Option<User>> {
    let chapter_progress: Option<i64> = conn
        .query_row(
            "SELECT chapter_progress FROM users WHERE username = ?1",
            params![username],
            |row| row.get(0),
        )
        .optional()?;

    let Some(chapter_progress) = chapter_progress else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT latin, correct_count, incorrect_count FROM vocab_progress WHERE username = ?1",
    )?;
    let vocab_progress = stmt
        .query_map(params![username], |row| {
            Ok((
                row.get::<_, String>(0)?,
                ProgressEntry::new(row.get(1)?, row.get(2)?),
            ))
        })?
        .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;

    Ok(Some(User {
        username: username.to_string(),
        chapter_progress,
        vocab_progress,
    }))
}

pub fn user_exists(conn: &Connection, username: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM users WHERE username = ?1",
        params![username],
        |row| row.get(0),
    )
}

/// Insert or replace a user and all of their progress rows
pub fn write_user(conn: &Connection, user: &User) -> rusqlite::Result<()> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        r#"
        INSERT INTO users (username, chapter_progress, created_at) VALUES (?1, ?2, ?3)
        ON CONFLICT(username) DO UPDATE SET chapter_progress = excluded.chapter_progress
        "#,
        params![user.username, user.chapter_progress, now],
    )?;
    conn.execute(
        "DELETE FROM vocab_progress WHERE username = ?1",
        params![user.username],
    )?;

    let mut stmt = conn.prepare(
        r#"
        INSERT INTO vocab_progress (username, latin, correct_count, incorrect_count, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )?;
    for (latin, entry) in &user.vocab_progress {
        stmt.execute(params![
            user.username,
            latin,
            entry.correct_count,
            entry.incorrect_count,
            now
        ])?;
    }
    Ok(())
}

/// Increment one counter for (username, latin), creating the row if needed
pub fn increment_progress(
    conn: &Connection,
    username: &str,
    latin: &str,
    is_correct: bool,
) -> rusqlite::Result<ProgressEntry> {
    let (correct, incorrect) = if is_correct { (1, 0) } else { (0, 1) };
    let now = Utc::now().to_rfc3339();
    conn.execute(
        r#"
        INSERT INTO vocab_progress (username, latin, correct_count, incorrect_count, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(username, latin) DO UPDATE SET
            correct_count = correct_count + excluded.correct_count,
            incorrect_count = incorrect_count + excluded.incorrect_count,
            updated_at = excluded.updated_at
        "#,
        params![username, latin, correct, incorrect, now],
    )?;

    conn.query_row(
        "SELECT correct_count, incorrect_count FROM vocab_progress WHERE username = ?1 AND latin = ?2",
        params![username, latin],
        |row| Ok(ProgressEntry::new(row.get(0)?, row.get(1)?)),
    )
}

/// SQLite-backed [`ProgressStore`]
#[derive(Clone)]
pub struct SqliteProgressStore {
    pool: DbPool,
}

impl SqliteProgressStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl ProgressStore for SqliteProgressStore {
    fn get_user(&self, username: &str) -> Result<Option<User>> {
        let conn = try_lock(&self.pool)?;
        Ok(get_user(&conn, username)?)
    }

    fn upsert_user(&self, user: &User) -> Result<()> {
        let mut conn = try_lock(&self.pool)?;
        let tx = conn.transaction()?;
        write_user(&tx, user)?;
        tx.commit()?;
        Ok(())
    }

    fn record_answer(
        &self,
        username: &str,
        latin: &str,
        is_correct: bool,
    ) -> Result<ProgressEntry> {
        let mut conn = try_lock(&self.pool)?;
        let tx = conn.transaction()?;
        if !user_exists(&tx, username)? {
            return Err(Error::not_found(format!("User not found: {}", username)));
        }
        let entry = increment_progress(&tx, username, latin, is_correct)?;
        tx.commit()?;
        Ok(entry)
    }
}
