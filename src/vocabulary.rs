//! Vocabulary books loaded from JSON files.
//!
//! Each book file has the shape `{ "chapters": [ { chapterNumber, chapterTitle,
//! words: [ { latin, english, latinSentence, englishSentence } ] } ] }`.
//! Files are parsed and validated once, then served from an in-memory cache.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::sync::{Arc, RwLock};

use crate::config::BookConfig;
use crate::domain::{Book, Chapter};
use crate::error::{Error, Result};

/// Book listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookInfo {
    pub id: String,
    pub title: String,
}

/// Read-only access to vocabulary books.
pub trait VocabularyStore: Send + Sync {
    /// Books this store can serve
    fn books(&self) -> Vec<BookInfo>;

    /// Load a book, failing with `DataUnavailable` for unknown ids or bad data
    fn load_book(&self, book_id: &str) -> Result<Arc<Book>>;
}

#[derive(Debug, Deserialize)]
struct BookFile {
    chapters: Vec<Chapter>,
}

/// Parse and validate a vocabulary document.
pub fn parse_book(id: &str, title: &str, json: &str) -> Result<Book> {
    let file: BookFile = serde_json::from_str(json)
        .map_err(|e| {
            Error::data_unavailable(format!("Invalid vocabulary for book {}: {}", id, e))
        })?;

    let mut seen_chapters = HashSet::new();
    let mut seen_words = HashSet::new();

    for chapter in &file.chapters {
        if !seen_chapters.insert(chapter.chapter_number) {
            tracing::warn!(
                "Book {}: duplicate chapter number {}, lookups use the first",
                id,
                chapter.chapter_number
            );
        }

        for (index, word) in chapter.words.iter().enumerate() {
            if word.latin.trim().is_empty() || word.english.trim().is_empty() {
                return Err(Error::data_unavailable(format!(
                    "Book {}: chapter {} word #{} has an empty latin or english form",
                    id, chapter.chapter_number, index
                )));
            }
            if !seen_words.insert(word.latin.as_str()) {
                tracing::warn!("Book {}: duplicate word '{}', lookups use the first", id, word.latin);
            }
        }
    }

    Ok(Book::new(id, title, file.chapters))
}

/// Vocabulary store backed by one JSON file per book
pub struct JsonVocabularyStore {
    books: Vec<BookConfig>,
    cache: RwLock<HashMap<String, Arc<Book>>>,
}

impl JsonVocabularyStore {
    pub fn new(books: Vec<BookConfig>) -> Self {
        Self {
            books,
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn read_book(&self, config: &BookConfig) -> Result<Book> {
        tracing::debug!("Reading vocabulary file: {}", config.path.display());
        let contents = fs::read_to_string(&config.path).map_err(|e| {
            Error::data_unavailable(format!(
                "Failed to read vocabulary file {}: {}",
                config.path.display(),
                e
            ))
        })?;
        let book = parse_book(&config.id, &config.title, &contents)?;
        tracing::info!(
            "Loaded book {} ({} chapters, {} words)",
            book.id,
            book.chapters.len(),
            book.words().count()
        );
        Ok(book)
    }
}

impl VocabularyStore for JsonVocabularyStore {
    fn books(&self) -> Vec<BookInfo> {
        self
            .books
            .iter()
            .map(|b| BookInfo {
                id: b.id.clone(),
                title: b.title.clone(),
            })
            .collect()
    }

    fn load_book(&self, book_id: &str) -> Result<Arc<Book>> {
        {
            let cache = self
                .cache
                .read()
                .map_err(|_| Error::data_unavailable("Vocabulary cache lock poisoned"))?;
            if let Some(book) = cache.get(book_id) {
                return Ok(Arc::clone(book));
            }
        }

        let config = self
            .books
            .iter()
            .find(|b| b.id == book_id)
            .ok_or_else(|| Error::data_unavailable(format!("Unknown book: {}", book_id)))?;
        let book = Arc::new(self.read_book(config)?);

        let mut cache = self
            .cache
            .write()
            .map_err(|_| Error::data_unavailable("Vocabulary cache lock poisoned"))?;
        // Another request may have loaded it meanwhile; keep the first copy
        let book = cache.entry(book_id.to_string()).or_insert(book);
        Ok(Arc::clone(book))
    }
}
