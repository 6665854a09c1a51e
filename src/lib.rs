// Declare modules
pub mod audio;
pub mod catalog;
pub mod dictionary;
pub mod error;
pub mod models;
pub mod progress;
pub mod server;
pub mod session;
pub mod store;

// Re-export key types for easier use
pub use audio::{AudioClient, AudioLookupResponse, AudioPlayer, AudioSource, Playback};
pub use catalog::Catalog;
pub use dictionary::{AudioEndpoints, DictionaryClient, normalize_word};
pub use error::{Result, VocabError};
pub use models::{Lesson, Mode, Preferences, WordEntry};
pub use progress::ProgressRecord;
pub use session::Session;
pub use store::{MemoryStore, SqliteStore, StateStore};

use directories_next::ProjectDirs;
use log::info;
use std::fs;
use std::path::PathBuf;

/// Subdirectory name within user's data directory
pub const DATA_SUBDIR: &str = "nlvocab-rs";
const DB_FILENAME: &str = "nlvocab.db";

/// Options for opening a study session.
#[derive(Debug, Default, Clone)]
pub struct LoadOptions {
    /// Optional path to the state database.
    /// If None, the default location based on ProjectDirs will be used.
    pub db_path: Option<PathBuf>,
    /// Optional word list to use instead of the embedded one.
    pub catalog_path: Option<PathBuf>,
}

impl LoadOptions {
    /// The database path these options resolve to.
    pub fn resolved_db_path(&self) -> Result<PathBuf> {
        match &self.db_path {
            Some(path) => Ok(path.clone()),
            None => get_default_db_path(),
        }
    }
}

/// Gets the default path for the SQLite state database.
pub fn get_default_db_path() -> Result<PathBuf> {
    let project_dirs =
        ProjectDirs::from("org", "NlVocab", DATA_SUBDIR).ok_or(VocabError::DataDirNotFound)?;
    let data_dir = project_dirs.data_dir();
    fs::create_dir_all(data_dir)?;
    Ok(data_dir.join(DB_FILENAME))
}

/// Loads the catalog named by the options, or the embedded one.
pub async fn load_catalog(options: &LoadOptions) -> Result<Catalog> {
    match &options.catalog_path {
        Some(path) => Catalog::load(path).await,
        None => Catalog::embedded(),
    }
}

/// Opens a session backed by the on-disk state database.
pub async fn open_session(options: &LoadOptions) -> Result<Session<SqliteStore>> {
    let catalog = load_catalog(options).await?;
    let db_path = options.resolved_db_path()?;
    let store = SqliteStore::open(&db_path)?;
    Session::open(catalog, store)
}

/// Deletes the state database, forgetting all progress and preferences.
///
/// If `db_path_override` is `None`, the default database path is cleared.
pub fn clear_database(db_path_override: Option<PathBuf>) -> Result<()> {
    let path = match db_path_override {
        Some(path) => path,
        None => get_default_db_path()?,
    };
    info!("Clearing state database: {:?}", path);
    store::clear_database(&path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_open_session_with_custom_paths() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("state.db");
        let catalog_path = temp_dir.path().join("words.json");
        std::fs::write(
            &catalog_path,
            r#"[{"lesson": 4, "topic": "Wonen", "words": [{"dutch": "het huis", "english": "the house"}]}]"#,
        )
        .unwrap();

        let options = LoadOptions {
            db_path: Some(db_path.clone()),
            catalog_path: Some(catalog_path),
        };

        {
            let mut session = open_session(&options).await.unwrap();
            assert_eq!(session.lesson_id(), "4#Wonen");
            session.set_learned("het huis", true).unwrap();
        }
        assert!(db_path.exists());

        let session = open_session(&options).await.unwrap();
        assert!(session.progress().is_learned("4#Wonen", "het huis"));
        drop(session);

        clear_database(Some(db_path.clone())).unwrap();
        assert!(!db_path.exists());
    }

    #[tokio::test]
    async fn test_missing_catalog_file_is_an_error() {
        let temp_dir = tempdir().unwrap();
        let options = LoadOptions {
            db_path: Some(temp_dir.path().join("state.db")),
            catalog_path: Some(temp_dir.path().join("missing.json")),
        };
        assert!(matches!(
            open_session(&options).await,
            Err(VocabError::Io(_))
        ));
    }
}
