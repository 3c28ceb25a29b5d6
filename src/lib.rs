pub mod constants;
pub mod db;
pub mod error;
pub mod media;
mod models;
pub mod session;
pub mod store;
#[cfg(test)]
mod test_utils;
pub mod usage;
pub mod validation;

pub use models::User;

use crate::db::{migrations, Database};
use crate::media::MediaLibrary;
use crate::session::SessionManager;
use crate::store::{CredentialStore, SqliteCredentialStore};
use crate::usage::{UsageConfig, UsageTracker};
use directories::ProjectDirs;
use log::error;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Error type for dashboard initialization failures
#[derive(Debug)]
pub enum InitError {
    NoProjectDirs,
    DataDirCreation(std::io::Error),
    DatabaseOpen(rusqlite::Error),
    Migration(rusqlite::Error),
}

impl std::fmt::Display for InitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InitError::NoProjectDirs => write!(f, "Could not determine project directories"),
            InitError::DataDirCreation(e) => write!(f, "Could not create data directory: {e}"),
            InitError::DatabaseOpen(e) => write!(f, "Failed to open database: {e}"),
            InitError::Migration(e) => write!(f, "Failed to run database migrations: {e}"),
        }
    }
}

impl std::error::Error for InitError {}

fn get_db_path() -> Result<PathBuf, InitError> {
    let proj_dirs =
        ProjectDirs::from("com", "learndash", "LearnDash").ok_or(InitError::NoProjectDirs)?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir).map_err(InitError::DataDirCreation)?;
    Ok(data_dir.join("learndash.db"))
}

/// The wired-up dashboard core: credential store, session machine, usage
/// tracker, and the session-scoped media list. Presentation layers own
/// one of these and call into its components.
pub struct App {
    pub session: SessionManager,
    pub usage: UsageTracker,
    pub media: MediaLibrary,
}

impl App {
    /// Open (or create) the database in the per-user data directory and
    /// wire up all components.
    pub fn open_default() -> Result<Self, InitError> {
        let db_path = get_db_path().inspect_err(|e| error!("initialization failed: {e}"))?;
        Self::open_at(&db_path)
    }

    /// Same as [`App::open_default`] but against an explicit database
    /// path.
    pub fn open_at(db_path: &Path) -> Result<Self, InitError> {
        let db = Database::open(db_path).map_err(|e| {
            error!("Failed to open database: {e}");
            InitError::DatabaseOpen(e)
        })?;
        if let Err(e) = migrations::run(db.connection()) {
            error!("Failed to run migrations: {e}");
            return Err(InitError::Migration(e));
        }

        let store = SqliteCredentialStore::new(Arc::new(Mutex::new(db)));
        let store: Arc<dyn CredentialStore> = Arc::new(store);

        Ok(Self {
            session: SessionManager::new(store),
            usage: UsageTracker::new(UsageConfig::default()),
            media: MediaLibrary::new(),
        })
    }
}
