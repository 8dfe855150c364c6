//! JSON API over the quiz service.
//!
//! Failures are returned as `{"error": message}` with a status derived from
//! the error kind.

pub mod practice;
pub mod users;
pub mod vocabulary;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::config::DEFAULT_BOOK;
use crate::error::Error;
use crate::state::AppState;

pub use practice::{next_question, submit_answer};
pub use users::{login, user_progress};
pub use vocabulary::{books, chapter, chapters};

/// Error wrapper that renders as a JSON body
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::DataUnavailable(_) | Error::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        } else {
            tracing::debug!("Request rejected: {}", self.0);
        }

        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

/// `?book=` query parameter, defaulting to the first book
#[derive(Debug, Default, Deserialize)]
pub struct BookQuery {
    pub book: Option<String>,
}

impl BookQuery {
    pub fn book_id(&self) -> &str {
        book_or_default(self.book.as_deref())
    }
}

fn book_or_default(book: Option<&str>) -> &str {
    book.filter(|b| !b.trim().is_empty()).unwrap_or(DEFAULT_BOOK)
}

/// Parse an optional query/body value with its `FromStr` impl
fn parse_optional<T>(value: Option<&str>) -> Result<Option<T>, Error>
where
    T: std::str::FromStr<Err = String>,
{
    value
        .filter(|v| !v.is_empty())
        .map(|v| v.parse::<T>().map_err(Error::validation))
        .transpose()
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/vocabulary/books", get(books))
        .route("/api/vocabulary/chapters", get(chapters))
        .route("/api/vocabulary/chapters/{chapter_number}", get(chapter))
        .route("/api/practice/next-question", get(next_question))
        .route("/api/practice/submit-answer", post(submit_answer))
        .route("/api/users/login", post(login))
        .route("/api/users/{username}/progress", get(user_progress))
        .with_state(state)
}
