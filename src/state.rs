//! Application state shared by all handlers.

use std::sync::Arc;

use crate::services::QuizService;

#[derive(Clone)]
pub struct AppState {
    pub quiz: Arc<QuizService>,
}

impl AppState {
    pub fn new(quiz: QuizService) -> Self {
        Self {
            quiz: Arc::new(quiz),
        }
    }
}
