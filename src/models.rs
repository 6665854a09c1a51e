use serde::{Deserialize, Serialize};

// --- Catalog ---

/// A named group of word entries, selectable as a study unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    /// Lesson number as printed in the course book.
    pub lesson: u32,
    pub topic: String,
    #[serde(default)]
    pub words: Vec<WordEntry>,
}

impl Lesson {
    /// Composite identifier, e.g. `"3#Eten en drinken"`.
    ///
    /// This is also the key under which learned words are persisted.
    pub fn id(&self) -> String {
        format!("{}#{}", self.lesson, self.topic)
    }

    /// Label used when listing lessons, e.g. `"3. Eten en drinken"`.
    pub fn label(&self) -> String {
        format!("{}. {}", self.lesson, self.topic)
    }
}

/// One target/source pair plus an example sentence and its translation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WordEntry {
    /// Target-language word (may carry an article or a parenthetical form).
    pub dutch: String,
    /// Source-language word.
    pub english: String,
    #[serde(default)]
    pub example: String,
    #[serde(default)]
    pub translation: String,
}

// --- Preferences ---

/// Study mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Shows every word of the lesson.
    #[default]
    Learn,
    /// Shows only words not yet learned, hiding the translation until revealed.
    Check,
}

impl Mode {
    /// Numeric code written to persisted state.
    pub fn code(self) -> u8 {
        match self {
            Mode::Learn => 1,
            Mode::Check => 2,
        }
    }

    /// Maps a persisted code back to a mode. Unknown codes yield `None`.
    pub fn from_code(code: &str) -> Option<Mode> {
        match code.trim().parse::<u8>().ok()? {
            1 => Some(Mode::Learn),
            2 => Some(Mode::Check),
            _ => None,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Mode::Learn => "Learn",
                Mode::Check => "Check",
            }
        )
    }
}

// Implement FromStr for Mode for CLI parsing
impl std::str::FromStr for Mode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "learn" | "1" => Ok(Mode::Learn),
            "check" | "2" => Ok(Mode::Check),
            _ => Err(format!("Invalid mode: {}", s)),
        }
    }
}

/// The learner's persisted display choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    pub lesson_id: String,
    pub mode: Mode,
    pub show_examples: bool,
}
