//! Error types for the quiz core.
//!
//! Every fallible operation returns [`Result`]; the HTTP layer decides how
//! each variant is surfaced (see `handlers::ApiError`).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Vocabulary or user data could not be loaded, parsed or locked
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// Unknown chapter, user or word, or an empty word pool
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or malformed request fields
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Progress store read/write failure
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn validation(what: impl Into<String>) -> Self {
        Self::Validation(what.into())
    }

    pub fn data_unavailable(what: impl Into<String>) -> Self {
        Self::DataUnavailable(what.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
