//! Answer grading.
//!
//! Multiple choice answers come from a fixed option list and are matched
//! exactly. Typed fill-in-the-blank answers are normalized and get partial
//! credit for a long-enough fragment of either form.

use serde::Serialize;

use crate::config::LearningConfig;
use crate::domain::{QuestionFormat, Word};

/// Result of grading a submitted answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerResult {
    /// Exact match with either form
    Correct,
    /// Substantial fragment of a form (fill-in-the-blank only)
    CloseEnough,
    Incorrect,
}

impl AnswerResult {
    pub fn is_correct(&self) -> bool {
        !matches!(self, Self::Incorrect)
    }
}

/// Grade `submitted` against both forms of `word`. Either form is accepted
/// regardless of the direction the question was asked in.
pub fn grade(
    submitted: &str,
    word: &Word,
    format: QuestionFormat,
    config: &LearningConfig,
) -> AnswerResult {
    match format {
        QuestionFormat::MultipleChoice => {
            grade_choice(submitted, word, config.choice_case_sensitive)
        }
        QuestionFormat::FillInTheBlank => grade_typed(submitted, word, config),
    }
}

fn grade_choice(submitted: &str, word: &Word, case_sensitive: bool) -> AnswerResult {
    let matches = |form: &str| {
        if case_sensitive {
            submitted == form
        } else {
            submitted.to_lowercase() == form.to_lowercase()
        }
    };

    if matches(&word.latin) || matches(&word.english) {
        AnswerResult::Correct
    } else {
        AnswerResult::Incorrect
    }
}

fn grade_typed(submitted: &str, word: &Word, config: &LearningConfig) -> AnswerResult {
    let answer = submitted.trim().to_lowercase();
    let forms = [word.latin.trim().to_lowercase(), word.english.trim().to_lowercase()];

    if forms.iter().any(|form| *form == answer) {
        return AnswerResult::Correct;
    }

    let answer_len = answer.chars().count();
    if answer_len < config.partial_min_chars {
        return AnswerResult::Incorrect;
    }

    let partial = forms.iter().any(|form| {
        form.contains(answer.as_str())
            && answer_len as f64 >= form.chars().count() as f64 * config.partial_match_ratio
    });
    if partial {
        AnswerResult::CloseEnough
    } else {
        AnswerResult::Incorrect
    }
}
