use serde::{Deserialize, Serialize};

/// A single vocabulary entry with one example sentence per language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub latin: String,
    pub english: String,
    pub latin_sentence: String,
    pub english_sentence: String,
}

impl Word {
    pub fn new(latin: &str, english: &str, latin_sentence: &str, english_sentence: &str) -> Self {
        Self {
            latin: latin.to_string(),
            english: english.to_string(),
            latin_sentence: latin_sentence.to_string(),
            english_sentence: english_sentence.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    /// External identifier, not necessarily the position in the book
    pub chapter_number: i64,
    pub chapter_title: String,
    pub words: Vec<Word>,
}

/// A loaded book: an ordered sequence of chapters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub title: String,
    pub chapters: Vec<Chapter>,
}

impl Book {
    pub fn new(id: &str, title: &str, chapters: Vec<Chapter>) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            chapters,
        }
    }

    /// All words in book order (chapter by chapter)
    pub fn words(&self) -> impl Iterator<Item = &Word> {
        self.chapters.iter().flat_map(|c| c.words.iter())
    }

    /// Look up a word by its Latin form; duplicates resolve to the first match
    pub fn find_word(&self, latin: &str) -> Option<&Word> {
        self.words().find(|w| w.latin == latin)
    }

    /// Book-order position of a word; duplicates resolve to the first match
    pub fn position(&self, latin: &str) -> Option<usize> {
        self.words().position(|w| w.latin == latin)
    }

    /// Look up a chapter by its chapter number
    pub fn chapter(&self, chapter_number: i64) -> Option<&Chapter> {
        self.chapter_index(chapter_number).map(|i| &self.chapters[i])
    }

    pub fn chapter_index(&self, chapter_number: i64) -> Option<usize> {
        self.chapters.iter().position(|c| c.chapter_number == chapter_number)
    }

    /// Chapter index for a 1-based progress pointer, clamped to the valid range
    pub fn progress_chapter_index(&self, chapter_progress: i64) -> Option<usize> {
        if self.chapters.is_empty() {
            return None;
        }
        let last = self.chapters.len() as i64 - 1;
        Some((chapter_progress - 1).clamp(0, last) as usize)
    }

    /// Words of the chapter at `index` paired with their book-order positions
    pub fn chapter_words(&self, index: usize) -> impl Iterator<Item = (usize, &Word)> {
        let offset: usize = self.chapters[..index].iter().map(|c| c.words.len()).sum();
        self.chapters[index]
            .words
            .iter()
            .enumerate()
            .map(move |(i, w)| (offset + i, w))
    }
}
