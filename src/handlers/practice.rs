use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use super::{book_or_default, parse_optional, ApiResult};
use crate::domain::{Question, QuestionFormat};
use crate::error::Error;
use crate::services::{AnswerFeedback, NextQuestionRequest, SubmitAnswer};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextQuestionQuery {
    pub book: Option<String>,
    pub chapter: Option<String>,
    pub mode: Option<String>,
    pub question_format: Option<String>,
    pub direction: Option<String>,
    pub username: Option<String>,
}

impl NextQuestionQuery {
    fn to_request(&self) -> Result<NextQuestionRequest, Error> {
        let chapter = self
            .chapter
            .as_deref()
            .filter(|c| !c.is_empty())
            .map(|c| {
                c.parse::<i64>()
                    .map_err(|_| Error::validation(format!("Invalid chapter: {}", c)))
            })
            .transpose()?;

        Ok(NextQuestionRequest {
            chapter,
            mode: parse_optional(self.mode.as_deref())?,
            username: self.username.clone(),
            format: parse_optional(self.question_format.as_deref())?,
            direction: parse_optional(self.direction.as_deref())?,
        })
    }
}

/// GET /api/practice/next-question
pub async fn next_question(
    State(state): State<AppState>,
    Query(query): Query<NextQuestionQuery>,
) -> ApiResult<Question> {
    let request = query.to_request()?;
    let question = state
        .quiz
        .next_question(book_or_default(query.book.as_deref()), request)?;
    Ok(Json(question))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerBody {
    pub username: Option<String>,
    pub latin_word: Option<String>,
    pub user_answer: Option<String>,
    pub format: Option<String>,
    pub book: Option<String>,
}

/// POST /api/practice/submit-answer
pub async fn submit_answer(
    State(state): State<AppState>,
    Json(body): Json<SubmitAnswerBody>,
) -> ApiResult<AnswerFeedback> {
    let format = parse_optional::<QuestionFormat>(body.format.as_deref())?;
    let book_id = book_or_default(body.book.as_deref()).to_string();
    let feedback = state
        .quiz
        .submit_answer(
            &book_id,
            SubmitAnswer {
                username: body.username,
                latin_word: body.latin_word,
                user_answer: body.user_answer,
                format,
            },
        )?;
    Ok(Json(feedback))
}
