//! The credential store contract and its SQLite implementation.
//!
//! The session manager only knows this trait, so tests can substitute an
//! in-memory fake. Every operation is individually atomic; no caller needs
//! multi-record transactions.

use crate::db::Database;
use crate::error::{is_unique_violation, AppError};
use crate::models::User;
use log::warn;
use std::sync::{Arc, Mutex, MutexGuard};

pub trait CredentialStore: Send + Sync {
    /// Insert a new record. Fails with `AlreadyExists` if the username or
    /// email is taken; never overwrites an existing record.
    fn insert_new(&self, user: &User) -> Result<(), AppError>;

    fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Re-key a record from `old` to `new`. Fails with `AlreadyExists` if
    /// `new` is taken and `NotFound` if `old` is absent.
    fn rename_user(&self, old: &str, new: &str) -> Result<(), AppError>;

    fn update_secret(&self, username: &str, secret: &str) -> Result<(), AppError>;

    fn update_email(&self, username: &str, email: &str) -> Result<(), AppError>;
}

/// Production store over a single SQLite connection. The mutex serializes
/// writes (single writer at a time per record is all callers assume).
pub struct SqliteCredentialStore {
    db: Arc<Mutex<Database>>,
}

impl SqliteCredentialStore {
    pub fn new(db: Arc<Mutex<Database>>) -> Self {
        Self { db }
    }

    fn lock_db(&self) -> MutexGuard<'_, Database> {
        match self.db.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("SqliteCredentialStore: database mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl CredentialStore for SqliteCredentialStore {
    fn insert_new(&self, user: &User) -> Result<(), AppError> {
        let db = self.lock_db();
        user.insert(db.connection()).map_err(|e| {
            if is_unique_violation(&e) {
                AppError::AlreadyExists { what: "Username or email" }
            } else {
                AppError::Database(e)
            }
        })
    }

    fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let db = self.lock_db();
        Ok(User::find_by_username(db.connection(), username)?)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let db = self.lock_db();
        Ok(User::find_by_email(db.connection(), email)?)
    }

    fn rename_user(&self, old: &str, new: &str) -> Result<(), AppError> {
        let db = self.lock_db();
        let changed = User::update_username(db.connection(), old, new).map_err(|e| {
            if is_unique_violation(&e) {
                AppError::AlreadyExists { what: "Username" }
            } else {
                AppError::Database(e)
            }
        })?;
        if changed == 0 {
            return Err(AppError::NotFound { entity: "User" });
        }
        Ok(())
    }

    fn update_secret(&self, username: &str, secret: &str) -> Result<(), AppError> {
        let db = self.lock_db();
        let changed = User::update_password(db.connection(), username, secret)?;
        if changed == 0 {
            return Err(AppError::NotFound { entity: "User" });
        }
        Ok(())
    }

    fn update_email(&self, username: &str, email: &str) -> Result<(), AppError> {
        let db = self.lock_db();
        let changed = User::update_email(db.connection(), username, email).map_err(|e| {
            if is_unique_violation(&e) {
                AppError::AlreadyExists { what: "Email" }
            } else {
                AppError::Database(e)
            }
        })?;
        if changed == 0 {
            return Err(AppError::NotFound { entity: "User" });
        }
        Ok(())
    }
}
