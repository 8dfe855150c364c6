//! Quiz service: the operations exposed to the HTTP layer.
//!
//! Mutations of one user's session and progress are serialized with a keyed
//! mutex; different users proceed independently. Lock entries live only while
//! a request holds them, and sessions are kept only for known users.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::LearningConfig;
use crate::db::ProgressStore;
use crate::domain::{Chapter, Direction, ProgressEntry, Question, QuestionFormat, User};
use crate::error::{Error, Result};
use crate::quiz::{build_question, grade, PoolSpec, WordSelector};
use crate::session::SessionTracker;
use crate::vocabulary::{BookInfo, VocabularyStore};

/// How the next word is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PracticeMode {
    Chapter,
    WeakWords,
}

impl PracticeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chapter => "chapter",
            Self::WeakWords => "weak-words",
        }
    }
}

impl std::str::FromStr for PracticeMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "chapter" => Ok(Self::Chapter),
            "weak-words" => Ok(Self::WeakWords),
            _ => Err(format!("Invalid practice mode: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NextQuestionRequest {
    pub chapter: Option<i64>,
    pub mode: Option<PracticeMode>,
    pub username: Option<String>,
    pub format: Option<QuestionFormat>,
    pub direction: Option<Direction>,
}

/// A submitted answer. Required fields are optional here so missing ones
/// surface as validation errors.
#[derive(Debug, Clone, Default)]
pub struct SubmitAnswer {
    pub username: Option<String>,
    pub latin_word: Option<String>,
    pub user_answer: Option<String>,
    /// Fill-in-the-blank grading applies when absent
    pub format: Option<QuestionFormat>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerFeedback {
    pub is_correct: bool,
    pub correct_answer_english: String,
    pub correct_answer_latin: String,
    pub latin_sentence: String,
    pub english_sentence: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub current_chapter: i64,
    pub vocab_progress: BTreeMap<String, ProgressEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub username: String,
    pub current_chapter: i64,
}

pub struct QuizService {
    vocabulary: Arc<dyn VocabularyStore>,
    progress: Arc<dyn ProgressStore>,
    sessions: Arc<dyn SessionTracker>,
    config: LearningConfig,
    rng: Mutex<StdRng>,
    user_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl QuizService {
    pub fn new(
        vocabulary: Arc<dyn VocabularyStore>,
        progress: Arc<dyn ProgressStore>,
        sessions: Arc<dyn SessionTracker>,
        config: LearningConfig,
    ) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            vocabulary,
            progress,
            sessions,
            config,
            rng: Mutex::new(rng),
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Select a word and build a question for it.
    ///
    /// Weak-words mode needs a username; without one the mode is ignored and
    /// the chapter (or the first chapter) is used. Unknown usernames are served
    /// like anonymous requests, except in weak-words mode where they fail.
    pub fn next_question(&self, book_id: &str, request: NextQuestionRequest) -> Result<Question> {
        let book = self.vocabulary.load_book(book_id)?;
        let username = request.username.as_deref().map(str::trim).filter(|u| !u.is_empty());

        let pool = match (request.mode, username, request.chapter) {
            (Some(PracticeMode::WeakWords), Some(_), _) => PoolSpec::WeakWords,
            (_, _, Some(chapter)) => PoolSpec::Chapter(chapter),
            _ => PoolSpec::Default,
        };

        let selector = WordSelector::new(&self.config);
        let word = match username {
            Some(username) => self.with_user_lock(username, || {
                let Some(user) = self.progress.get_user(username)? else {
                    if pool == PoolSpec::WeakWords {
                        return Err(Error::not_found(format!("User not found: {}", username)));
                    }
                    let mut rng = self.rng()?;
                    return selector.select(&book, pool, None, None, &mut *rng);
                };

                let mut session = self.sessions.load(username);
                let mut rng = self.rng()?;
                let word =
                    selector.select(&book, pool, Some(&user), Some(&mut session), &mut *rng)?;
                self.sessions.store(username, session);
                Ok(word)
            })?,
            None => {
                let mut rng = self.rng()?;
                selector.select(&book, pool, None, None, &mut *rng)?
            }
        };

        let mut rng = self.rng()?;
        Ok(build_question(word, book.words(), request.format, request.direction, &mut *rng))
    }

    /// Grade an answer, then record it in the user's progress and session.
    pub fn submit_answer(&self, book_id: &str, answer: SubmitAnswer) -> Result<AnswerFeedback> {
        let username = required(answer.username.as_deref(), "username")?;
        let latin_word = required(answer.latin_word.as_deref(), "latinWord")?;
        // Graded untrimmed: multiple choice matches exactly
        let user_answer = answer
            .user_answer
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| Error::validation("Missing required field: userAnswer"))?;
        let format = answer.format.unwrap_or(QuestionFormat::FillInTheBlank);

        let book = self.vocabulary.load_book(book_id)?;
        let word = book
            .find_word(latin_word)
            .ok_or_else(|| Error::not_found(format!("Word not found: {}", latin_word)))?;

        let result = grade(user_answer, word, format, &self.config);
        let is_correct = result.is_correct();
        let entry = self.with_user_lock(username, || {
            let entry = self.progress.record_answer(username, &word.latin, is_correct)?;

            let mut session = self.sessions.load(username);
            if is_correct {
                session.clear_incorrect(&word.latin);
            } else {
                session.mark_incorrect(&word.latin);
            }
            self.sessions.store(username, session);
            Ok(entry)
        })?;

        tracing::debug!(
            "{} answered '{}' for '{}': {:?} ({} correct, {} incorrect)",
            username,
            user_answer,
            word.latin,
            result,
            entry.correct_count,
            entry.incorrect_count
        );

        Ok(AnswerFeedback {
            is_correct,
            correct_answer_english: word.english.clone(),
            correct_answer_latin: word.latin.clone(),
            latin_sentence: word.latin_sentence.clone(),
            english_sentence: word.english_sentence.clone(),
            message: if is_correct {
                "Correct! Great job!".to_string()
            } else {
                "Incorrect. Try again!".to_string()
            },
        })
    }

    pub fn user_progress(&self, username: &str) -> Result<ProgressReport> {
        let user = self
            .progress
            .get_user(username)?
            .ok_or_else(|| Error::not_found(format!("User not found: {}", username)))?;
        Ok(ProgressReport {
            current_chapter: user.chapter_progress,
            vocab_progress: user.vocab_progress,
        })
    }

    /// Return the user, creating it on first login
    pub fn login_or_create(&self, username: Option<&str>) -> Result<LoginResponse> {
        let username = required(username, "username")?;

        let user = self.with_user_lock(username, || match self.progress.get_user(username)? {
            Some(user) => Ok(user),
            None => {
                let user = User::new(username);
                self.progress.upsert_user(&user)?;
                tracing::info!("Created user {}", username);
                Ok(user)
            }
        })?;

        Ok(LoginResponse {
            username: user.username,
            current_chapter: user.chapter_progress,
        })
    }

    pub fn books(&self) -> Vec<BookInfo> {
        self.vocabulary.books()
    }

    pub fn chapters(&self, book_id: &str) -> Result<Vec<Chapter>> {
        Ok(self.vocabulary.load_book(book_id)?.chapters.clone())
    }

    pub fn chapter(&self, book_id: &str, chapter_number: i64) -> Result<Chapter> {
        self
            .vocabulary
            .load_book(book_id)?
            .chapter(chapter_number)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("Chapter not found: {}", chapter_number)))
    }

    /// Run `f` holding the per-user lock. The map entry is dropped once no
    /// other request holds or waits on it.
    fn with_user_lock<T>(&self, username: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock = Arc::clone(self.user_locks().entry(username.to_string()).or_default());

        let result = match lock.lock() {
            Ok(_guard) => f(),
            Err(_) => Err(Error::data_unavailable("User state lock poisoned")),
        };
        drop(lock);

        let mut locks = self.user_locks();
        if locks.get(username).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(username);
        }
        result
    }

    fn user_locks(&self) -> MutexGuard<'_, HashMap<String, Arc<Mutex<()>>>> {
        // The map holds no invariants a panic could break
        self.user_locks.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn rng(&self) -> Result<MutexGuard<'_, StdRng>> {
        self
            .rng
            .lock()
            .map_err(|_| Error::data_unavailable("Random source unavailable"))
    }
}

/// Trimmed, non-empty request field
fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::validation(format!("Missing required field: {}", field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_memory_db, SqliteProgressStore};
    use crate::session::MemorySessionTracker;
    use crate::testing::{
        sample_book, sample_book_file, test_config, test_service, test_service_with,
        StaticVocabularyStore,
    };
    use crate::vocabulary::JsonVocabularyStore;

    fn login(service: &QuizService, username: &str) {
        service.login_or_create(Some(username)).unwrap();
    }

    fn answer(service: &QuizService, username: &str, latin: &str, text: &str) -> AnswerFeedback {
        service
            .submit_answer(
                "bk1",
                SubmitAnswer {
                    username: Some(username.to_string()),
                    latin_word: Some(latin.to_string()),
                    user_answer: Some(text.to_string()),
                    format: Some(QuestionFormat::FillInTheBlank),
                },
            )
            .unwrap()
    }

    fn next(service: &QuizService, username: Option<&str>, mode: Option<PracticeMode>) -> Question {
        service
            .next_question(
                "bk1",
                NextQuestionRequest {
                    chapter: Some(1),
                    mode,
                    username: username.map(str::to_string),
                    ..Default::default()
                },
            )
            .unwrap()
    }

    #[test]
    fn test_practice_mode_parse() {
        assert_eq!("chapter".parse::<PracticeMode>(), Ok(PracticeMode::Chapter));
        assert_eq!("weak-words".parse::<PracticeMode>(), Ok(PracticeMode::WeakWords));
        assert!("random".parse::<PracticeMode>().is_err());
        assert_eq!(PracticeMode::WeakWords.as_str(), "weak-words");
    }

    #[test]
    fn test_login_creates_user_once() {
        let service = test_service();
        let first = service.login_or_create(Some("livia")).unwrap();
        assert_eq!(
            first,
            LoginResponse {
                username: "livia".to_string(),
                current_chapter: 1
            }
        );
        answer(&service, "livia", "canis", "dog");

        // Logging in again keeps existing progress
        service.login_or_create(Some("livia")).unwrap();
        let progress = service.user_progress("livia").unwrap();
        assert_eq!(progress.vocab_progress.get("canis"), Some(&ProgressEntry::new(1, 0)));
    }

    #[test]
    fn test_login_requires_username() {
        let service = test_service();
        assert!(matches!(service.login_or_create(None), Err(Error::Validation(_))));
        assert!(matches!(service.login_or_create(Some("  ")), Err(Error::Validation(_))));
    }

    #[test]
    fn test_progress_unknown_user() {
        let service = test_service();
        assert!(matches!(service.user_progress("nobody"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_submit_correct_and_incorrect() {
        let service = test_service();
        login(&service, "livia");

        let feedback = answer(&service, "livia", "canis", "Dog ");
        assert!(feedback.is_correct);
        assert_eq!(feedback.message, "Correct! Great job!");
        assert_eq!(feedback.correct_answer_english, "dog");
        assert_eq!(feedback.correct_answer_latin, "canis");
        assert_eq!(feedback.latin_sentence, "canis in via dormit.");

        let feedback = answer(&service, "livia", "canis", "cat");
        assert!(!feedback.is_correct);
        assert_eq!(feedback.message, "Incorrect. Try again!");

        let progress = service.user_progress("livia").unwrap();
        assert_eq!(progress.current_chapter, 1);
        assert_eq!(progress.vocab_progress.get("canis"), Some(&ProgressEntry::new(1, 1)));
    }

    #[test]
    fn test_submit_multiple_choice_is_exact() {
        let service = test_service();
        login(&service, "livia");
        let feedback = service
            .submit_answer(
                "bk1",
                SubmitAnswer {
                    username: Some("livia".to_string()),
                    latin_word: Some("canis".to_string()),
                    user_answer: Some("Dog".to_string()),
                    format: Some(QuestionFormat::MultipleChoice),
                },
            )
            .unwrap();
        assert!(!feedback.is_correct);
    }

    #[test]
    fn test_submit_validation_and_lookup_errors() {
        let service = test_service();
        login(&service, "livia");

        let missing_answer = SubmitAnswer {
            username: Some("livia".to_string()),
            latin_word: Some("canis".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            service.submit_answer("bk1", missing_answer),
            Err(Error::Validation(_))
        ));

        let unknown_word = SubmitAnswer {
            username: Some("livia".to_string()),
            latin_word: Some("felis".to_string()),
            user_answer: Some("cat".to_string()),
            format: None,
        };
        assert!(matches!(
            service.submit_answer("bk1", unknown_word),
            Err(Error::NotFound(_))
        ));

        let unknown_user = SubmitAnswer {
            username: Some("marcus".to_string()),
            latin_word: Some("canis".to_string()),
            user_answer: Some("dog".to_string()),
            format: None,
        };
        assert!(matches!(
            service.submit_answer("bk1", unknown_user),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_unknown_book_unavailable() {
        let service = test_service();
        let result = service.next_question("bk9", NextQuestionRequest::default());
        assert!(matches!(result, Err(Error::DataUnavailable(_))));
    }

    #[test]
    fn test_unknown_chapter_not_found() {
        let service = test_service();
        let result = service.next_question(
            "bk1",
            NextQuestionRequest {
                chapter: Some(99),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_wrong_answer_is_retried_next() {
        let service = test_service();
        login(&service, "livia");

        let first = next(&service, Some("livia"), None);
        assert_eq!(first.latin_word, "canis");
        let second = next(&service, Some("livia"), None);
        assert_eq!(second.latin_word, "servus");

        answer(&service, "livia", "canis", "cat");
        let retry = next(&service, Some("livia"), None);
        assert_eq!(retry.latin_word, "canis");

        // Retry does not move the sequential cursor
        let after = next(&service, Some("livia"), None);
        assert_eq!(after.latin_word, "coquus");
    }

    #[test]
    fn test_correct_answer_clears_retry() {
        let service = test_service();
        login(&service, "livia");
        next(&service, Some("livia"), None);
        answer(&service, "livia", "canis", "cat");
        answer(&service, "livia", "canis", "dog");

        let question = next(&service, Some("livia"), None);
        assert_eq!(question.latin_word, "servus");
    }

    #[test]
    fn test_weak_words_requires_known_user() {
        let service = test_service();
        let result = service.next_question(
            "bk1",
            NextQuestionRequest {
                mode: Some(PracticeMode::WeakWords),
                username: Some("ghost".to_string()),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_unknown_usernames_leave_no_state() {
        let sessions = Arc::new(MemorySessionTracker::new());
        let service = QuizService::new(
            Arc::new(StaticVocabularyStore::new(vec![sample_book()])),
            Arc::new(SqliteProgressStore::new(init_memory_db().unwrap())),
            sessions.clone(),
            test_config(),
        );

        for i in 0..500 {
            let visitor = format!("visitor{}", i);
            next(&service, Some(&visitor), None);
            let weak = service.next_question(
                "bk1",
                NextQuestionRequest {
                    mode: Some(PracticeMode::WeakWords),
                    username: Some(visitor.clone()),
                    ..Default::default()
                },
            );
            assert!(matches!(weak, Err(Error::NotFound(_))));
        }

        assert!(sessions.is_empty());
        assert!(service.user_locks.lock().unwrap().is_empty());
    }

    #[test]
    fn test_user_lock_released_after_requests() {
        let sessions = Arc::new(MemorySessionTracker::new());
        let service = QuizService::new(
            Arc::new(StaticVocabularyStore::new(vec![sample_book()])),
            Arc::new(SqliteProgressStore::new(init_memory_db().unwrap())),
            sessions.clone(),
            test_config(),
        );
        login(&service, "livia");
        next(&service, Some("livia"), None);
        answer(&service, "livia", "canis", "cat");

        assert!(service.user_locks.lock().unwrap().is_empty());
        // Known users keep their session
        assert_eq!(sessions.len(), 1);
    }

    #[test]
    fn test_anonymous_weak_words_uses_chapter() {
        let service = test_service();
        let question = next(&service, None, Some(PracticeMode::WeakWords));
        let book = crate::testing::sample_book();
        assert!(book.chapter(1).unwrap().words.iter().any(|w| w.latin == question.latin_word));
    }

    #[test]
    fn test_corrected_word_leaves_weak_pool() {
        let service = test_service();
        login(&service, "livia");
        // canis: 2 correct, 1 incorrect; villa: 2 incorrect
        answer(&service, "livia", "canis", "dog");
        answer(&service, "livia", "canis", "dog");
        answer(&service, "livia", "canis", "cat");
        answer(&service, "livia", "villa", "cat");
        answer(&service, "livia", "villa", "cat");

        let weak = |s: &QuizService| {
            s.next_question(
                "bk1",
                NextQuestionRequest {
                    mode: Some(PracticeMode::WeakWords),
                    username: Some("livia".to_string()),
                    ..Default::default()
                },
            )
            .unwrap()
            .latin_word
        };

        // Both words are pending retries; the first in book order comes first
        assert_eq!(weak(&service), "canis");
        answer(&service, "livia", "canis", "dog");
        // canis now 3 of 4 correct: no longer weak and no longer pending
        assert_eq!(weak(&service), "villa");
        for _ in 0..5 {
            assert_ne!(weak(&service), "canis");
        }
    }

    #[test]
    fn test_question_is_well_formed() {
        let service = test_service();
        for _ in 0..20 {
            let question = service
                .next_question(
                    "bk1",
                    NextQuestionRequest {
                        format: Some(QuestionFormat::MultipleChoice),
                        ..Default::default()
                    },
                )
                .unwrap();
            assert_eq!(question.options.len(), 4);
            assert!(question.options.contains(&question.correct_answer));
            assert!(!question.question_text.is_empty());
        }
    }

    #[test]
    fn test_browse_chapters() {
        let service = test_service();
        let chapters = service.chapters("bk1").unwrap();
        assert_eq!(chapters.len(), 2);
        assert_eq!(service.chapter("bk1", 2).unwrap().chapter_title, "in villa");
        assert!(matches!(service.chapter("bk1", 3), Err(Error::NotFound(_))));
        assert_eq!(service.books().len(), 1);
    }

    #[test]
    fn test_service_over_json_files() {
        let (_temp, book) = sample_book_file();
        let service = QuizService::new(
            Arc::new(JsonVocabularyStore::new(vec![book])),
            Arc::new(SqliteProgressStore::new(init_memory_db().unwrap())),
            Arc::new(MemorySessionTracker::new()),
            test_config(),
        );
        let question = next(&service, None, None);
        assert!(!question.latin_word.is_empty());
        assert_eq!(service.chapter("bk1", 1).unwrap().words.len(), 4);
    }

    #[test]
    fn test_random_order_without_session() {
        let config = LearningConfig {
            sequential_order: false,
            ..test_config()
        };
        let service = test_service_with(config);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..40 {
            seen.insert(next(&service, None, None).latin_word);
        }
        assert!(seen.len() > 1);
    }

    #[test]
    fn test_concurrent_answers_are_all_recorded() {
        let service = test_service();
        login(&service, "livia");
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..5 {
                        answer(&service, "livia", "servus", "slave");
                    }
                });
            }
        });
        let progress = service.user_progress("livia").unwrap();
        assert_eq!(progress.vocab_progress.get("servus"), Some(&ProgressEntry::new(40, 0)));
    }
}
