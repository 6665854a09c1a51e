//! Learned-word progress and preference loading.
//!
//! Everything here reads from or writes to a [`StateStore`]. Loading never
//! fails on bad persisted values: each one falls back to its default.

use crate::catalog::Catalog;
use crate::error::{Result, VocabError};
use crate::models::{Mode, Preferences};
use crate::store::{KEY_EXAMPLES, KEY_LEARNT_WORDS, KEY_LESSON_ID, KEY_MODE, StateStore};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Lesson id -> set of target-language words marked learned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressRecord {
    lessons: BTreeMap<String, BTreeSet<String>>,
}

impl ProgressRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the persisted JSON form. Malformed input yields an empty record.
    pub fn from_json_lenient(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(record) => record,
            Err(e) => {
                warn!("Discarding malformed learned-words data: {}", e);
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(VocabError::from)
    }

    pub fn is_learned(&self, lesson_id: &str, word: &str) -> bool {
        self.lessons
            .get(lesson_id)
            .is_some_and(|words| words.contains(word))
    }

    pub fn learned_count(&self, lesson_id: &str) -> usize {
        self.lessons.get(lesson_id).map_or(0, BTreeSet::len)
    }

    /// Returns a copy with `word` added to or removed from the lesson's set.
    ///
    /// The lesson's entry is replaced as a whole, and kept (possibly empty)
    /// after a removal.
    pub fn with_word(&self, lesson_id: &str, word: &str, learned: bool) -> Self {
        let mut lesson_words = self.lessons.get(lesson_id).cloned().unwrap_or_default();
        if learned {
            lesson_words.insert(word.to_string());
        } else {
            lesson_words.remove(word);
        }

        let mut lessons = self.lessons.clone();
        lessons.insert(lesson_id.to_string(), lesson_words);
        ProgressRecord { lessons }
    }

    pub fn lesson_ids(&self) -> impl Iterator<Item = &str> {
        self.lessons.keys().map(String::as_str)
    }
}

/// Reads the learned-words mapping from the store.
pub fn load_progress(store: &dyn StateStore) -> Result<ProgressRecord> {
    let record = match store.get(KEY_LEARNT_WORDS)? {
        Some(json) => ProgressRecord::from_json_lenient(&json),
        None => ProgressRecord::new(),
    };
    debug!(
        "Loaded progress for {} lessons.",
        record.lesson_ids().count()
    );
    Ok(record)
}

/// Writes the whole learned-words mapping to the store.
pub fn save_progress(store: &mut dyn StateStore, record: &ProgressRecord) -> Result<()> {
    store.set(KEY_LEARNT_WORDS, &record.to_json()?)
}

/// Reads the preferences, defaulting each field independently.
pub fn load_preferences(store: &dyn StateStore, catalog: &Catalog) -> Result<Preferences> {
    let default_lesson = catalog.last().ok_or(VocabError::EmptyCatalog)?;

    let lesson_id = match store.get(KEY_LESSON_ID)? {
        Some(stored) if catalog.contains(&stored) => stored,
        Some(stored) => {
            warn!(
                "Stored lesson '{}' is not in the catalog, using '{}'.",
                stored,
                default_lesson.id()
            );
            default_lesson.id()
        }
        None => default_lesson.id(),
    };

    let mode = store
        .get(KEY_MODE)?
        .and_then(|code| Mode::from_code(&code))
        .unwrap_or_default();

    let show_examples = store.get(KEY_EXAMPLES)?.as_deref() != Some("false");

    Ok(Preferences {
        lesson_id,
        mode,
        show_examples,
    })
}

pub fn save_lesson_id(store: &mut dyn StateStore, lesson_id: &str) -> Result<()> {
    store.set(KEY_LESSON_ID, lesson_id)
}

pub fn save_mode(store: &mut dyn StateStore, mode: Mode) -> Result<()> {
    store.set(KEY_MODE, &mode.code().to_string())
}

pub fn save_show_examples(store: &mut dyn StateStore, show_examples: bool) -> Result<()> {
    store.set(KEY_EXAMPLES, if show_examples { "true" } else { "false" })
}
