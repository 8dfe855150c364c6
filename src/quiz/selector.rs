//! Next-word selection with retry priority, mastery and recency filtering.
//!
//! Order of precedence:
//! 1. Words the user recently got wrong (pending retries) within the pool
//! 2. The resolved pool minus mastered words (unless that starves the pool)
//! 3. Minus recently served words (history resets when everything was seen)
//! 4. Sequential walk through the pool, or a uniform random pick

use rand::Rng;

use crate::config::LearningConfig;
use crate::domain::{Book, User, Word};
use crate::error::{Error, Result};
use crate::session::SessionState;

/// Which words a request draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolSpec {
    /// First chapter of the book
    Default,
    /// A chapter by its chapter number
    Chapter(i64),
    /// Words the user answers wrong too often
    WeakWords,
}

impl std::fmt::Display for PoolSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Chapter(n) => write!(f, "chapter:{}", n),
            Self::WeakWords => write!(f, "weak-words"),
        }
    }
}

/// A pool word together with its position in book order
type Slot<'b> = (usize, &'b Word);

pub struct WordSelector<'c> {
    config: &'c LearningConfig,
}

impl<'c> WordSelector<'c> {
    pub fn new(config: &'c LearningConfig) -> Self {
        Self { config }
    }

    /// Pick the next word.
    ///
    /// `user` supplies mastery data (and is required for weak-words);
    /// `session` enables retries, recency filtering and sequential order and is
    /// updated with the pick.
    pub fn select<'b, R: Rng + ?Sized>(
        &self,
        book: &'b Book,
        pool: PoolSpec,
        user: Option<&User>,
        mut session: Option<&mut SessionState>,
        rng: &mut R,
    ) -> Result<&'b Word> {
        let resolved = self.resolve_pool(book, pool, user)?;

        if let Some(session) = session.as_deref_mut() {
            if let Some(word) = self.take_retry(book, pool, &resolved, session) {
                tracing::debug!("Retrying previously missed word '{}'", word.latin);
                session.record_served(&word.latin, self.config.recent_words_max_count);
                return Ok(word);
            }
        }

        let unmastered = self.filter_mastered(&resolved, user, session.as_deref());

        let candidates = match session.as_deref_mut() {
            Some(session) => {
                let fresh: Vec<Slot<'b>> = unmastered
                    .iter()
                    .copied()
                    .filter(|(_, w)| !session.was_recently_served(&w.latin))
                    .collect();
                if fresh.is_empty() && !unmastered.is_empty() {
                    tracing::debug!("Word pool exhausted, resetting history");
                    session.clear_history();
                    unmastered
                } else {
                    fresh
                }
            }
            None => unmastered,
        };

        if candidates.is_empty() {
            return Err(Error::not_found("No words available for practice"));
        }

        let pool_key = format!("{}:{}", book.id, pool);
        let (position, word) = match session.as_deref_mut() {
            Some(session) if self.config.sequential_order => {
                // Resume after the book position of the last served word
                let after = session
                    .cursor_for(&pool_key)
                    .and_then(|latin| book.position(latin));
                let next = candidates
                    .iter()
                    .copied()
                    .find(|(i, _)| after.is_none_or(|a| *i > a))
                    .unwrap_or(candidates[0]);
                session.set_cursor(&pool_key, &next.1.latin);
                next
            }
            _ => candidates[rng.random_range(0..candidates.len())],
        };

        tracing::debug!(
            "Selected '{}' (book position {}, {} of {} words in {} are candidates)",
            word.latin,
            position,
            candidates.len(),
            resolved.len(),
            pool_key
        );

        if let Some(session) = session {
            session.record_served(&word.latin, self.config.recent_words_max_count);
        }
        Ok(word)
    }

    /// Words of the requested pool in book order. Unknown chapters and missing
    /// users fail; empty pools are returned as-is.
    fn resolve_pool<'b>(
        &self,
        book: &'b Book,
        pool: PoolSpec,
        user: Option<&User>,
    ) -> Result<Vec<Slot<'b>>> {
        match pool {
            PoolSpec::Default => Ok(if book.chapters.is_empty() {
                Vec::new()
            } else {
                book.chapter_words(0).collect()
            }),
            PoolSpec::Chapter(number) => book
                .chapter_index(number)
                .map(|i| book.chapter_words(i).collect())
                .ok_or_else(|| Error::not_found(format!("Chapter not found: {}", number))),
            PoolSpec::WeakWords => {
                let user =
                    user.ok_or_else(|| Error::not_found("Weak-words practice requires a known user"))?;
                let weak: Vec<Slot<'b>> = book
                    .words()
                    .enumerate()
                    .filter(|(_, w)| self.is_weak(user, &w.latin))
                    .collect();
                if !weak.is_empty() {
                    return Ok(weak);
                }
                tracing::debug!(
                    "No weak words for {}, falling back to chapter progress {}",
                    user.username,
                    user.chapter_progress
                );
                Ok(
                    book
                        .progress_chapter_index(user.chapter_progress)
                        .map(|i| book.chapter_words(i).collect())
                        .unwrap_or_default(),
                )
            }
        }
    }

    /// First pending retry within the retry scope, removed from the set.
    /// Weak-words retries span the whole book; other modes their own pool.
    fn take_retry<'b>(
        &self,
        book: &'b Book,
        pool: PoolSpec,
        resolved: &[Slot<'b>],
        session: &mut SessionState,
    ) -> Option<&'b Word> {
        if session.incorrect_words.is_empty() {
            return None;
        }
        let word = match pool {
            PoolSpec::WeakWords => book.words().find(|w| session.is_pending_retry(&w.latin)),
            _ => resolved
                .iter()
                .map(|(_, w)| *w)
                .find(|w| session.is_pending_retry(&w.latin)),
        }?;
        session.clear_incorrect(&word.latin);
        Some(word)
    }

    fn is_weak(&self, user: &User, latin: &str) -> bool {
        user
            .progress_for(latin)
            .is_some_and(|p| p.total() > 0 && p.error_rate() > self.config.weak_word_threshold)
    }

    fn is_mastered(&self, user: &User, latin: &str) -> bool {
        user.progress_for(latin).is_some_and(|p| {
            p.correct_count >= self.config.master_threshold
                && p.accuracy() >= self.config.master_accuracy_threshold
        })
    }

    /// Remove mastered words unless they are pending retry. Skipped entirely
    /// when it would remove at least `mastery_starvation_ratio` of the pool.
    fn filter_mastered<'b>(
        &self,
        slots: &[Slot<'b>],
        user: Option<&User>,
        session: Option<&SessionState>,
    ) -> Vec<Slot<'b>> {
        let Some(user) = user else {
            return slots.to_vec();
        };

        let kept: Vec<Slot<'b>> = slots
            .iter()
            .copied()
            .filter(|(_, w)| {
                !self.is_mastered(user, &w.latin)
                    || session.is_some_and(|s| s.is_pending_retry(&w.latin))
            })
            .collect();

        let removed = slots.len() - kept.len();
        if removed > 0
            && removed as f64 >= slots.len() as f64 * self.config.mastery_starvation_ratio
        {
            tracing::debug!(
                "Mastery filter would remove {} of {} words, keeping the full pool",
                removed,
                slots.len()
            );
            return slots.to_vec();
        }
        kept
    }
}
