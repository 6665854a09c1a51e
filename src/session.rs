//! The study session: catalog, progress and preferences tied together.

use crate::audio::{AudioPlayer, Playback};
use crate::catalog::Catalog;
use crate::error::{Result, VocabError};
use crate::models::{Lesson, Mode, Preferences, WordEntry};
use crate::progress::{self, ProgressRecord};
use crate::store::StateStore;
use log::{debug, info};

/// One learner's session. Owns its store; every mutation is persisted
/// before the method returns.
pub struct Session<S: StateStore> {
    catalog: Catalog,
    store: S,
    progress: ProgressRecord,
    preferences: Preferences,
}

impl<S: StateStore> Session<S> {
    /// Loads preferences and progress from `store`, defaulting what is missing
    /// or invalid.
    pub fn open(catalog: Catalog, store: S) -> Result<Self> {
        let preferences = progress::load_preferences(&store, &catalog)?;
        let progress = progress::load_progress(&store)?;
        info!(
            "Session opened on lesson '{}' in {} mode.",
            preferences.lesson_id, preferences.mode
        );
        Ok(Session {
            catalog,
            store,
            progress,
            preferences,
        })
    }

    /// Gives the store back.
    pub fn close(self) -> S {
        self.store
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn progress(&self) -> &ProgressRecord {
        &self.progress
    }

    pub fn lesson_id(&self) -> &str {
        &self.preferences.lesson_id
    }

    pub fn mode(&self) -> Mode {
        self.preferences.mode
    }

    pub fn show_examples(&self) -> bool {
        self.preferences.show_examples
    }

    /// The selected lesson.
    ///
    /// A selection that is not in the catalog is a data-integrity bug; there
    /// is nothing sensible to show, so it is reported as an error.
    pub fn current_lesson(&self) -> Result<&Lesson> {
        self.catalog
            .find(&self.preferences.lesson_id)
            .ok_or_else(|| VocabError::LessonNotFound(self.preferences.lesson_id.clone()))
    }

    /// Words to show for the current lesson and mode.
    ///
    /// Learn mode shows the whole lesson; Check mode leaves out learned words.
    /// Catalog order is kept either way.
    pub fn visible_words(&self) -> Result<Vec<&WordEntry>> {
        let lesson = self.current_lesson()?;
        let words: Vec<&WordEntry> = match self.preferences.mode {
            Mode::Learn => lesson.words.iter().collect(),
            Mode::Check => lesson
                .words
                .iter()
                .filter(|entry| !self.is_learned(entry))
                .collect(),
        };
        debug!(
            "{} of {} words visible in lesson '{}'.",
            words.len(),
            lesson.words.len(),
            lesson.id()
        );
        Ok(words)
    }

    /// Same as [`visible_words`](Self::visible_words), with learned words
    /// moved to the end in Learn mode.
    pub fn visible_words_learned_last(&self) -> Result<Vec<&WordEntry>> {
        let mut words = self.visible_words()?;
        // Stable sort keeps catalog order within each group.
        words.sort_by_key(|entry| self.is_learned(entry));
        Ok(words)
    }

    /// Whether the entry's target word is learned in the current lesson.
    pub fn is_learned(&self, entry: &WordEntry) -> bool {
        self.progress
            .is_learned(&self.preferences.lesson_id, &entry.dutch)
    }

    /// Marks a target word learned or not learned in the current lesson.
    ///
    /// Only words of the current lesson can be marked learned. Unmarking is
    /// always allowed so stray entries can be cleaned up. The whole mapping
    /// is written to the store first; memory is only updated once that
    /// succeeded.
    pub fn set_learned(&mut self, word: &str, learned: bool) -> Result<()> {
        if learned
            && !self
                .current_lesson()?
                .words
                .iter()
                .any(|entry| entry.dutch == word)
        {
            return Err(VocabError::InvalidArgument(format!(
                "'{}' is not in lesson '{}'",
                word, self.preferences.lesson_id
            )));
        }
        let updated = self
            .progress
            .with_word(&self.preferences.lesson_id, word, learned);
        progress::save_progress(&mut self.store, &updated)?;
        self.progress = updated;
        debug!(
            "Marked '{}' as {} in lesson '{}'.",
            word,
            if learned { "learned" } else { "not learned" },
            self.preferences.lesson_id
        );
        Ok(())
    }

    pub fn set_lesson(&mut self, lesson_id: &str) -> Result<()> {
        progress::save_lesson_id(&mut self.store, lesson_id)?;
        self.preferences.lesson_id = lesson_id.to_string();
        Ok(())
    }

    pub fn set_mode(&mut self, mode: Mode) -> Result<()> {
        progress::save_mode(&mut self.store, mode)?;
        self.preferences.mode = mode;
        Ok(())
    }

    pub fn set_show_examples(&mut self, show_examples: bool) -> Result<()> {
        progress::save_show_examples(&mut self.store, show_examples)?;
        self.preferences.show_examples = show_examples;
        Ok(())
    }

    /// Requests pronunciation of an entry's target word.
    pub async fn play(&self, player: &AudioPlayer, entry: &WordEntry) -> Option<Playback> {
        player.request(&entry.dutch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioClient, AudioSource};
    use crate::dictionary::DictionaryClient;
    use crate::dictionary::tests::spawn_fake_dictionary;
    use crate::store::{KEY_LEARNT_WORDS, KEY_LESSON_ID, KEY_MODE, MemoryStore, SqliteStore};
    use tempfile::tempdir;

    const CATALOG: &str = r#"[
        {"lesson": 1, "topic": "Kennismaken", "words": [
            {"dutch": "de naam", "english": "the name", "example": "", "translation": ""},
            {"dutch": "het land", "english": "the country", "example": "", "translation": ""}
        ]},
        {"lesson": 2, "topic": "Dieren", "words": [
            {"dutch": "de kat", "english": "the cat", "example": "De kat slaapt.", "translation": "The cat sleeps."},
            {"dutch": "de hond", "english": "the dog", "example": "", "translation": ""},
            {"dutch": "het paard", "english": "the horse", "example": "", "translation": ""},
            {"dutch": "de vogel", "english": "the bird", "example": "", "translation": ""}
        ]}
    ]"#;

    fn catalog() -> Catalog {
        Catalog::from_json_str(CATALOG).unwrap()
    }

    fn session() -> Session<MemoryStore> {
        Session::open(catalog(), MemoryStore::new()).unwrap()
    }

    fn dutch<'a>(words: &[&'a WordEntry]) -> Vec<&'a str> {
        words.iter().map(|entry| entry.dutch.as_str()).collect()
    }

    /// Store that refuses every write.
    struct ReadOnlyStore;

    impl StateStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }
        fn set(&mut self, key: &str, _value: &str) -> Result<()> {
            Err(VocabError::Internal(format!("read-only store: {}", key)))
        }
    }

    #[test]
    fn test_defaults_to_last_lesson() {
        let session = session();
        assert_eq!(session.lesson_id(), "2#Dieren");
        assert_eq!(session.mode(), Mode::Learn);
        assert!(session.show_examples());
    }

    #[test]
    fn test_open_with_empty_catalog_fails() {
        assert!(matches!(
            Session::open(Catalog::new(Vec::new()), MemoryStore::new()),
            Err(VocabError::EmptyCatalog)
        ));
    }

    #[test]
    fn test_learned_round_trip() {
        let mut session = session();
        let lesson = session.current_lesson().unwrap().clone();
        for entry in &lesson.words {
            assert!(!session.is_learned(entry));
        }

        let cat = &lesson.words[0];
        session.set_learned(&cat.dutch, true).unwrap();
        assert!(session.is_learned(cat));
        session.set_learned(&cat.dutch, false).unwrap();
        assert!(!session.is_learned(cat));
    }

    #[test]
    fn test_marking_twice_is_idempotent() {
        let mut session = session();
        session.set_learned("de kat", true).unwrap();
        let once = session.progress().clone();
        session.set_learned("de kat", true).unwrap();
        assert_eq!(session.progress(), &once);
        assert_eq!(session.progress().learned_count("2#Dieren"), 1);
    }

    #[test]
    fn test_marking_unknown_word_is_rejected() {
        let mut session = session();
        session.set_learned("de kat", true).unwrap();
        assert!(matches!(
            session.set_learned("de kta", true),
            Err(VocabError::InvalidArgument(_))
        ));
        // Words of another lesson are unknown here too.
        assert!(session.set_learned("de naam", true).is_err());
        assert_eq!(session.progress().learned_count("2#Dieren"), 1);

        let store = session.close();
        assert_eq!(
            store.get(KEY_LEARNT_WORDS).unwrap().as_deref(),
            Some(r#"{"2#Dieren":["de kat"]}"#)
        );
    }

    #[test]
    fn test_unmarking_stray_word_cleans_it_up() {
        let mut store = MemoryStore::new();
        store
            .set(KEY_LEARNT_WORDS, r#"{"2#Dieren":["de kat","de kta"]}"#)
            .unwrap();
        let mut session = Session::open(catalog(), store).unwrap();
        assert_eq!(session.progress().learned_count("2#Dieren"), 2);

        session.set_learned("de kta", false).unwrap();
        assert_eq!(session.progress().learned_count("2#Dieren"), 1);
        assert!(session.progress().is_learned("2#Dieren", "de kat"));
    }

    #[test]
    fn test_learned_sets_are_per_lesson() {
        let mut session = session();
        session.set_learned("de kat", true).unwrap();
        session.set_lesson("1#Kennismaken").unwrap();

        let cat = session.catalog().find_word("2#Dieren", "de kat").unwrap().clone();
        assert!(!session.is_learned(&cat));
        assert_eq!(session.progress().learned_count("2#Dieren"), 1);
        assert_eq!(session.progress().learned_count("1#Kennismaken"), 0);
    }

    #[test]
    fn test_check_mode_hides_learned_words() {
        let mut session = session();
        session.set_learned("de hond", true).unwrap();
        session.set_learned("de vogel", true).unwrap();

        session.set_mode(Mode::Check).unwrap();
        let visible = session.visible_words().unwrap();
        assert_eq!(dutch(&visible), vec!["de kat", "het paard"]);
        assert!(visible.iter().all(|entry| !session.is_learned(entry)));
    }

    #[test]
    fn test_learn_mode_shows_full_lesson() {
        let mut session = session();
        session.set_learned("de hond", true).unwrap();

        let lesson_words: Vec<&WordEntry> =
            session.current_lesson().unwrap().words.iter().collect();
        assert_eq!(session.visible_words().unwrap(), lesson_words);
    }

    #[test]
    fn test_learned_last_ordering() {
        let mut session = session();
        session.set_learned("de kat", true).unwrap();
        session.set_learned("het paard", true).unwrap();

        let words = session.visible_words_learned_last().unwrap();
        assert_eq!(dutch(&words), vec!["de hond", "de vogel", "de kat", "het paard"]);

        session.set_mode(Mode::Check).unwrap();
        let words = session.visible_words_learned_last().unwrap();
        assert_eq!(dutch(&words), vec!["de hond", "de vogel"]);
    }

    #[test]
    fn test_unknown_selected_lesson_is_fatal_for_derivation() {
        let mut session = session();
        session.set_lesson("9#Nergens").unwrap();
        assert!(matches!(
            session.visible_words(),
            Err(VocabError::LessonNotFound(id)) if id == "9#Nergens"
        ));
    }

    #[test]
    fn test_mutations_are_persisted() {
        let mut session = session();
        session.set_learned("de kat", true).unwrap();
        session.set_mode(Mode::Check).unwrap();
        session.set_lesson("1#Kennismaken").unwrap();
        session.set_show_examples(false).unwrap();

        let store = session.close();
        assert_eq!(store.get(KEY_MODE).unwrap().as_deref(), Some("2"));
        assert_eq!(store.get(KEY_LESSON_ID).unwrap().as_deref(), Some("1#Kennismaken"));
        assert_eq!(
            store.get(KEY_LEARNT_WORDS).unwrap().as_deref(),
            Some(r#"{"2#Dieren":["de kat"]}"#)
        );

        let reopened = Session::open(catalog(), store).unwrap();
        assert_eq!(reopened.mode(), Mode::Check);
        assert_eq!(reopened.lesson_id(), "1#Kennismaken");
        assert!(!reopened.show_examples());
        assert!(reopened.progress().is_learned("2#Dieren", "de kat"));
    }

    #[test]
    fn test_failed_write_leaves_state_unchanged() {
        let mut session = Session::open(catalog(), ReadOnlyStore).unwrap();
        assert!(session.set_learned("de kat", true).is_err());
        assert_eq!(session.progress(), &ProgressRecord::new());
        assert!(session.set_mode(Mode::Check).is_err());
        assert_eq!(session.mode(), Mode::Learn);
    }

    #[test]
    fn test_malformed_persisted_progress_resets() {
        let mut store = MemoryStore::new();
        store.set(KEY_LEARNT_WORDS, "{\"2#Dieren\": [").unwrap();
        store.set(KEY_MODE, "check").unwrap();
        let session = Session::open(catalog(), store).unwrap();
        assert_eq!(session.progress(), &ProgressRecord::new());
        assert_eq!(session.mode(), Mode::Learn);
    }

    #[test]
    fn test_sqlite_backed_session() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("state.db");

        {
            let store = SqliteStore::open(&db_path).unwrap();
            let mut session = Session::open(catalog(), store).unwrap();
            session.set_learned("het paard", true).unwrap();
            session.set_mode(Mode::Check).unwrap();
        }

        let store = SqliteStore::open(&db_path).unwrap();
        let session = Session::open(catalog(), store).unwrap();
        assert_eq!(
            dutch(&session.visible_words().unwrap()),
            vec!["de kat", "de hond", "de vogel"]
        );
    }

    #[tokio::test]
    async fn test_play_uses_target_word() {
        let (endpoints, _) = spawn_fake_dictionary().await;
        let dictionary = DictionaryClient::new(endpoints.clone()).unwrap();
        let player = AudioPlayer::new(AudioClient::new(AudioSource::Direct(dictionary)));
        let session = session();
        let entry = session.visible_words().unwrap()[0].clone();

        let playback = session.play(&player, &entry).await.unwrap();
        assert_eq!(playback.word, "de kat");
        assert_eq!(playback.url, endpoints.media_url("kat.mp3"));
    }
}
