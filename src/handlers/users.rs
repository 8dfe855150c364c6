use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use super::ApiResult;
use crate::services::{LoginResponse, ProgressReport};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub username: Option<String>,
}

/// POST /api/users/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> ApiResult<LoginResponse> {
    Ok(Json(state.quiz.login_or_create(body.username.as_deref())?))
}

/// GET /api/users/{username}/progress
pub async fn user_progress(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<ProgressReport> {
    Ok(Json(state.quiz.user_progress(&username)?))
}
