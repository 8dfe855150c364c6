//! Test fixtures: sample books, temp vocabulary files and in-memory stores.

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

use crate::config::{BookConfig, LearningConfig};
use crate::db::{init_memory_db, SqliteProgressStore};
use crate::domain::{Book, Chapter, Word};
use crate::error::{Error, Result};
use crate::services::QuizService;
use crate::session::MemorySessionTracker;
use crate::vocabulary::{BookInfo, VocabularyStore};

pub const TEST_SEED: u64 = 42;

pub fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(TEST_SEED)
}

fn chapter(number: i64, title: &str, words: Vec<Word>) -> Chapter {
    Chapter {
        chapter_number: number,
        chapter_title: title.to_string(),
        words,
    }
}

/// Two chapters of Cambridge Latin Course style vocabulary
pub fn sample_book() -> Book {
    Book::new(
        "bk1",
        "Cambridge Latin Course Book 1",
        vec![
            chapter(
                1,
                "Caecilius",
                vec![
                    Word::new("canis", "dog", "canis in via dormit.", "The dog is sleeping in the street."),
                    Word::new("servus", "slave", "servus in atrio laborat.", "The slave is working in the atrium."),
                    Word::new("coquus", "cook", "coquus in culina est.", "The cook is in the kitchen."),
                    Word::new("mercator", "merchant", "mercator in foro ambulat.", "The merchant walks in the forum."),
                ],
            ),
            chapter(
                2,
                "in villa",
                vec![
                    Word::new("villa", "house", "villa est magna.", "The house is big."),
                    Word::new("amicus", "friend", "amicus Caecilium salutat.", "The friend greets Caecilius."),
                    Word::new("hortus", "garden", "Metella in horto sedet.", "Metella sits in the garden."),
                ],
            ),
        ],
    )
}

pub fn sample_book_json() -> String {
    let book = sample_book();
    serde_json::json!({ "chapters": book.chapters }).to_string()
}

/// Vocabulary store over fixed in-memory books
pub struct StaticVocabularyStore {
    books: HashMap<String, Arc<Book>>,
}

impl StaticVocabularyStore {
    pub fn new(books: Vec<Book>) -> Self {
        Self {
            books: books.into_iter().map(|b| (b.id.clone(), Arc::new(b))).collect(),
        }
    }
}

impl VocabularyStore for StaticVocabularyStore {
    fn books(&self) -> Vec<BookInfo> {
        let mut books: Vec<BookInfo> = self
            .books
            .values()
            .map(|b| BookInfo {
                id: b.id.clone(),
                title: b.title.clone(),
            })
            .collect();
        books.sort_by(|a, b| a.id.cmp(&b.id));
        books
    }

    fn load_book(&self, book_id: &str) -> Result<Arc<Book>> {
        self
            .books
            .get(book_id)
            .cloned()
            .ok_or_else(|| Error::data_unavailable(format!("Unknown book: {}", book_id)))
    }
}

/// Write the sample book to a temp dir and return a matching book config
pub fn sample_book_file() -> (TempDir, BookConfig) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("vocabulary-bk1.json");
    std::fs::write(&path, sample_book_json()).unwrap();
    let config = BookConfig {
        id: "bk1".to_string(),
        title: "Cambridge Latin Course Book 1".to_string(),
        path,
    };
    (temp, config)
}

pub fn test_config() -> LearningConfig {
    LearningConfig {
        rng_seed: Some(TEST_SEED),
        ..LearningConfig::default()
    }
}

/// Quiz service over the sample book with in-memory stores
pub fn test_service() -> QuizService {
    test_service_with(test_config())
}

pub fn test_service_with(config: LearningConfig) -> QuizService {
    QuizService::new(
        Arc::new(StaticVocabularyStore::new(vec![sample_book()])),
        Arc::new(SqliteProgressStore::new(init_memory_db().unwrap())),
        Arc::new(MemorySessionTracker::new()),
        config,
    )
}
