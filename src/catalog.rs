//! Static word catalog: the read-only list of lessons.
//!
//! The default catalog is compiled into the binary from `assets/wordlists.json`.
//! A different word list with the same shape can be loaded from disk.

use crate::error::{Result, VocabError};
use crate::models::{Lesson, WordEntry};
use log::{debug, info};
use std::path::Path;

const EMBEDDED_WORDLISTS: &str = include_str!("../assets/wordlists.json");

/// Read-only list of lessons in catalog order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    lessons: Vec<Lesson>,
}

impl Catalog {
    /// Builds a catalog from already parsed lessons.
    pub fn new(lessons: Vec<Lesson>) -> Self {
        Catalog { lessons }
    }

    /// Returns the word list shipped with the crate.
    pub fn embedded() -> Result<Self> {
        Self::from_json_str(EMBEDDED_WORDLISTS)
    }

    /// Parses a catalog from its JSON form (an array of lessons).
    pub fn from_json_str(json: &str) -> Result<Self> {
        let lessons: Vec<Lesson> = serde_json::from_str(json)?;
        debug!("Parsed catalog with {} lessons.", lessons.len());
        Ok(Catalog { lessons })
    }

    /// Reads and parses a catalog file.
    pub async fn load(path: &Path) -> Result<Self> {
        info!("Reading word catalog from {:?}", path);
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_json_str(&json)
    }

    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    /// Finds a lesson by its composite identifier.
    pub fn find(&self, lesson_id: &str) -> Option<&Lesson> {
        self.lessons.iter().find(|lesson| lesson.id() == lesson_id)
    }

    pub fn contains(&self, lesson_id: &str) -> bool {
        self.find(lesson_id).is_some()
    }

    /// Last lesson in catalog order, the default selection.
    pub fn last(&self) -> Option<&Lesson> {
        self.lessons.last()
    }

    /// Resolves user input that is either a full lesson id or a bare lesson number.
    pub fn resolve(&self, input: &str) -> Result<&Lesson> {
        let input = input.trim();
        if let Some(lesson) = self.find(input) {
            return Ok(lesson);
        }
        if let Ok(number) = input.parse::<u32>() {
            if let Some(lesson) = self.lessons.iter().find(|lesson| lesson.lesson == number) {
                return Ok(lesson);
            }
        }
        Err(VocabError::LessonNotFound(input.to_string()))
    }

    /// Finds a word entry in a lesson by its target-language form.
    pub fn find_word(&self, lesson_id: &str, dutch: &str) -> Option<&WordEntry> {
        self.find(lesson_id)?
            .words
            .iter()
            .find(|entry| entry.dutch == dutch)
    }
}
