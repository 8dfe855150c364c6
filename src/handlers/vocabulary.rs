use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::{ApiResult, BookQuery};
use crate::domain::Chapter;
use crate::state::AppState;
use crate::vocabulary::BookInfo;

/// GET /api/vocabulary/books
pub async fn books(State(state): State<AppState>) -> Json<Vec<BookInfo>> {
    Json(state.quiz.books())
}

/// GET /api/vocabulary/chapters
pub async fn chapters(
    State(state): State<AppState>,
    Query(query): Query<BookQuery>,
) -> ApiResult<Vec<Chapter>> {
    Ok(Json(state.quiz.chapters(query.book_id())?))
}

/// GET /api/vocabulary/chapters/{chapter_number}
pub async fn chapter(
    State(state): State<AppState>,
    Path(chapter_number): Path<i64>,
    Query(query): Query<BookQuery>,
) -> ApiResult<Chapter> {
    Ok(Json(state.quiz.chapter(query.book_id(), chapter_number)?))
}
