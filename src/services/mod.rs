//! Application services.

pub mod quiz;

pub use quiz::{
    AnswerFeedback, LoginResponse, NextQuestionRequest, PracticeMode, ProgressReport, QuizService,
    SubmitAnswer,
};
