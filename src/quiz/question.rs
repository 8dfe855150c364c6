//! Question construction: prompt text, cloze sentences and answer options.

use rand::Rng;
use rand::seq::SliceRandom;
use regex::{NoExpand, Regex};
use std::collections::HashSet;

use crate::config::{CLOZE_BLANK, OPTION_COUNT};
use crate::domain::{Direction, Question, QuestionFormat, Word};

/// Build a question for `word`.
///
/// Missing `format` or `direction` are chosen at random. Distractors for
/// multiple choice are drawn from `vocabulary`.
pub fn build_question<'a, R, I>(
    word: &Word,
    vocabulary: I,
    format: Option<QuestionFormat>,
    direction: Option<Direction>,
    rng: &mut R,
) -> Question
where
    R: Rng + ?Sized,
    I: IntoIterator<Item = &'a Word>,
{
    let format = format.unwrap_or_else(|| {
        if rng.random_bool(0.5) {
            QuestionFormat::MultipleChoice
        } else {
            QuestionFormat::FillInTheBlank
        }
    });
    let direction = direction.unwrap_or_else(|| {
        if rng.random_bool(0.5) {
            Direction::LatinToEnglish
        } else {
            Direction::EnglishToLatin
        }
    });

    let (question_text, correct_answer) = match (format, direction) {
        (QuestionFormat::MultipleChoice, Direction::LatinToEnglish) => (
            format!("What is the English translation of \"{}\"?", word.latin),
            word.english.clone(),
        ),
        (QuestionFormat::MultipleChoice, Direction::EnglishToLatin) => (
            format!("What is the Latin translation of \"{}\"?", word.english),
            word.latin.clone(),
        ),
        (QuestionFormat::FillInTheBlank, Direction::LatinToEnglish) => (
            format!("Fill in the blank with the English translation of \"{}\":", word.latin),
            word.english.clone(),
        ),
        (QuestionFormat::FillInTheBlank, Direction::EnglishToLatin) => (
            format!("Fill in the blank with the Latin translation of \"{}\":", word.english),
            word.latin.clone(),
        ),
    };

    let (sentence, options) = match format {
        QuestionFormat::FillInTheBlank => {
            let source = match direction {
                Direction::LatinToEnglish => &word.english_sentence,
                Direction::EnglishToLatin => &word.latin_sentence,
            };
            (Some(blank_out(source, &correct_answer)), Vec::new())
        }
        QuestionFormat::MultipleChoice => {
            let pool = vocabulary.into_iter().map(|w| match direction {
                Direction::LatinToEnglish => w.english.as_str(),
                Direction::EnglishToLatin => w.latin.as_str(),
            });
            (None, generate_options(&correct_answer, pool, direction, rng))
        }
    };

    Question {
        format,
        direction,
        question_text,
        latin_word: word.latin.clone(),
        english_word: match direction {
            Direction::EnglishToLatin => Some(word.english.clone()),
            Direction::LatinToEnglish => None,
        },
        correct_answer,
        sentence,
        options,
        latin_sentence: word.latin_sentence.clone(),
        english_sentence: word.english_sentence.clone(),
    }
}

/// Replace the first whole-word, case-insensitive occurrence of `answer`.
/// Word boundaries are required only at edges that are word characters.
/// Returns the sentence unchanged when the answer does not occur.
pub fn blank_out(sentence: &str, answer: &str) -> String {
    if answer.trim().is_empty() {
        tracing::warn!("Empty answer, leaving sentence '{}' unchanged", sentence);
        return sentence.to_string();
    }

    let is_word_char = |c: char| c.is_alphanumeric() || c == '_';
    let lead = if answer.starts_with(is_word_char) { r"\b" } else { "" };
    let trail = if answer.ends_with(is_word_char) { r"\b" } else { "" };
    let pattern = format!(r"(?i){}{}{}", lead, regex::escape(answer), trail);
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            tracing::warn!("Could not build cloze pattern for '{}': {}", answer, e);
            return sentence.to_string();
        }
    };

    if !re.is_match(sentence) {
        tracing::warn!("Answer '{}' not found in sentence '{}'", answer, sentence);
        return sentence.to_string();
    }
    re.replacen(sentence, 1, NoExpand(CLOZE_BLANK)).into_owned()
}

/// Four shuffled options: the correct answer plus distractors that differ
/// from it and from each other case-insensitively.
fn generate_options<'a, R: Rng + ?Sized>(
    correct: &str,
    pool: impl Iterator<Item = &'a str>,
    direction: Direction,
    rng: &mut R,
) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    seen.insert(correct.to_lowercase());

    let mut candidates: Vec<&str> = pool
        .filter(|c| !c.trim().is_empty() && seen.insert(c.to_lowercase()))
        .collect();
    candidates.shuffle(rng);

    let mut options = vec![correct.to_string()];
    options.extend(
        candidates
            .into_iter()
            .take(OPTION_COUNT - 1)
            .map(str::to_string),
    );

    if options.len() < OPTION_COUNT {
        tracing::warn!(
            "Only {} distinct options for '{}', padding with placeholders",
            options.len(),
            correct
        );
        let prefix = match direction {
            Direction::LatinToEnglish => "option",
            Direction::EnglishToLatin => "latinum",
        };
        let mut n = options.len();
        while options.len() < OPTION_COUNT {
            let pad = format!("{}{}", prefix, n);
            if seen.insert(pad.to_lowercase()) {
                options.push(pad);
            }
            n += 1;
        }
    }

    if !options_are_valid(&options, correct) {
        tracing::warn!("Invalid option set for '{}', using descriptive alternatives", correct);
        options = descriptive_alternatives(correct, direction);
    }

    options.shuffle(rng);
    options
}

fn options_are_valid(options: &[String], correct: &str) -> bool {
    let distinct: HashSet<String> = options.iter().map(|o| o.to_lowercase()).collect();
    options.len() == OPTION_COUNT
        && distinct.len() == OPTION_COUNT
        && options.iter().filter(|o| o.as_str() == correct).count() == 1
}

fn descriptive_alternatives(correct: &str, direction: Direction) -> Vec<String> {
    match direction {
        Direction::LatinToEnglish => vec![
            correct.to_string(),
            format!("not a {}", correct),
            format!("similar to {}", correct),
            format!("kind of {}", correct),
        ],
        Direction::EnglishToLatin => vec![
            correct.to_string(),
            format!("non-{}", correct),
            format!("quasi-{}", correct),
            format!("similis-{}", correct),
        ],
    }
}
