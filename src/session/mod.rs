//! The session state machine: login, registration, and profile mutation
//! against a [`CredentialStore`], exposed to observers as one immutable
//! state snapshot.
//!
//! Operations are synchronous methods meant to be called off the UI
//! timeline; the caller owns threading. Each operation applies its state
//! transitions as whole-snapshot replacements, in the order
//! (loading = true) then (final result), so listeners never see a torn
//! update. Errors never propagate out of an operation — they land in the
//! error slot of the operation's class.

use crate::error::AppError;
use crate::models::User;
use crate::store::CredentialStore;
use crate::validation::{validate_login, validate_password_change, validate_registration};
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

/// Immutable snapshot of the session component at one instant.
///
/// `logged_in == true` implies `username` and `email` are `Some`. The
/// three (loading, error) pairs are independent: login and register share
/// the `auth` pair, username rename owns the `profile` pair, and password
/// change owns the `password` pair plus the one-shot success flag.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SessionState {
    pub logged_in: bool,
    pub username: Option<String>,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub registered_at_millis: Option<i64>,

    pub auth_loading: bool,
    pub auth_error: Option<String>,

    pub profile_loading: bool,
    pub profile_error: Option<String>,

    pub password_loading: bool,
    pub password_error: Option<String>,
    pub password_update_success: bool,
}

pub struct SessionManager {
    store: Arc<dyn CredentialStore>,
    state: Mutex<SessionState>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Current snapshot. Poll after an operation returns to observe its
    /// outcome.
    pub fn state(&self) -> SessionState {
        self.lock_state().clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("SessionManager: state mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Mark the auth (login/register) class as loading. Returns false if a
    /// login or register is already in flight; re-entry is ignored.
    fn begin_auth(&self) -> bool {
        let mut state = self.lock_state();
        if state.auth_loading {
            debug!("login/register ignored: one is already in flight");
            return false;
        }
        *state = SessionState {
            auth_loading: true,
            auth_error: None,
            ..state.clone()
        };
        true
    }

    fn begin_profile(&self) -> bool {
        let mut state = self.lock_state();
        if state.profile_loading {
            debug!("username update ignored: one is already in flight");
            return false;
        }
        *state = SessionState {
            profile_loading: true,
            profile_error: None,
            ..state.clone()
        };
        true
    }

    fn begin_password(&self) -> bool {
        let mut state = self.lock_state();
        if state.password_loading {
            debug!("password update ignored: one is already in flight");
            return false;
        }
        *state = SessionState {
            password_loading: true,
            password_error: None,
            password_update_success: false,
            ..state.clone()
        };
        true
    }

    /// Log in with a username and password. Observe the result through the
    /// snapshot: on success `logged_in` flips and the identity fields are
    /// populated from storage; on failure `auth_error` carries the reason.
    pub fn login(&self, username: &str, password: &str) {
        if !self.begin_auth() {
            return;
        }

        match self.try_login(username, password) {
            Ok(user) => {
                info!("user '{}' logged in", user.username);
                let mut state = self.lock_state();
                *state = SessionState {
                    logged_in: true,
                    username: Some(user.username),
                    email: Some(user.email),
                    display_name: Some(user.display_name),
                    registered_at_millis: Some(user.registered_at_millis),
                    auth_loading: false,
                    auth_error: None,
                    ..state.clone()
                };
            }
            Err(e) => self.fail_auth(e),
        }
    }

    fn try_login(&self, username: &str, password: &str) -> Result<User, AppError> {
        validate_login(username, password)?;
        let user = self
            .store
            .find_by_username(username)?
            .ok_or(AppError::NotFound { entity: "User" })?;
        if user.password_secret != password {
            return Err(AppError::IncorrectPassword);
        }
        Ok(user)
    }

    /// Register a new account and log it in immediately. Validation order
    /// and conflict checks are fixed; the first failure wins.
    pub fn register(&self, username: &str, email: &str, password: &str, confirm_password: &str) {
        if !self.begin_auth() {
            return;
        }

        match self.try_register(username, email, password, confirm_password) {
            Ok(user) => {
                info!("registered user '{}'", user.username);
                let mut state = self.lock_state();
                *state = SessionState {
                    logged_in: true,
                    username: Some(user.username),
                    email: Some(user.email),
                    display_name: Some(user.display_name),
                    registered_at_millis: Some(user.registered_at_millis),
                    auth_loading: false,
                    auth_error: None,
                    ..state.clone()
                };
            }
            Err(e) => self.fail_auth(e),
        }
    }

    fn try_register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<User, AppError> {
        validate_registration(username, email, password, confirm_password)?;
        if self.store.find_by_username(username)?.is_some() {
            return Err(AppError::AlreadyExists { what: "Username" });
        }
        if self.store.find_by_email(email)?.is_some() {
            return Err(AppError::AlreadyExists { what: "Email" });
        }
        let user = User::new(username, email, password);
        self.store.insert_new(&user)?;
        Ok(user)
    }

    fn fail_auth(&self, e: AppError) {
        let mut state = self.lock_state();
        *state = SessionState {
            auth_loading: false,
            auth_error: Some(e.to_string()),
            ..state.clone()
        };
    }

    /// Rename the logged-in user. The stored record and the snapshot move
    /// together: the snapshot picks up the new name only after storage
    /// reports success, so a fault leaves both referring to the old one.
    pub fn update_username(&self, new_username: &str) {
        if new_username.trim().is_empty() {
            let mut state = self.lock_state();
            *state = SessionState {
                profile_error: Some(
                    AppError::InvalidInput {
                        field: "username",
                        reason: "cannot be empty".into(),
                    }
                    .to_string(),
                ),
                ..state.clone()
            };
            return;
        }

        if !self.begin_profile() {
            return;
        }

        let Some(old_username) = self.state().username else {
            let mut state = self.lock_state();
            *state = SessionState {
                profile_loading: false,
                profile_error: Some(AppError::NotFound { entity: "User" }.to_string()),
                ..state.clone()
            };
            return;
        };

        match self.store.rename_user(&old_username, new_username) {
            Ok(()) => {
                info!("renamed user '{old_username}' to '{new_username}'");
                let mut state = self.lock_state();
                *state = SessionState {
                    username: Some(new_username.to_string()),
                    profile_loading: false,
                    profile_error: None,
                    ..state.clone()
                };
            }
            Err(e) => {
                let mut state = self.lock_state();
                *state = SessionState {
                    profile_loading: false,
                    profile_error: Some(e.to_string()),
                    ..state.clone()
                };
            }
        }
    }

    /// Change the logged-in user's password. On success the one-shot
    /// `password_update_success` flag is set; it and `password_error` are
    /// never both present.
    pub fn update_password(&self, current: &str, new: &str, confirm: &str) {
        if !self.begin_password() {
            return;
        }

        let result = match self.state().username {
            Some(username) => self.try_update_password(&username, current, new, confirm),
            None => Err(AppError::NotFound { entity: "User" }),
        };

        let mut state = self.lock_state();
        match result {
            Ok(()) => {
                *state = SessionState {
                    password_loading: false,
                    password_error: None,
                    password_update_success: true,
                    ..state.clone()
                };
            }
            Err(e) => {
                *state = SessionState {
                    password_loading: false,
                    password_error: Some(e.to_string()),
                    password_update_success: false,
                    ..state.clone()
                };
            }
        }
    }

    fn try_update_password(
        &self,
        username: &str,
        current: &str,
        new: &str,
        confirm: &str,
    ) -> Result<(), AppError> {
        validate_password_change(current, new, confirm)?;
        let user = self
            .store
            .find_by_username(username)?
            .ok_or(AppError::NotFound { entity: "User" })?;
        if user.password_secret != current {
            return Err(AppError::IncorrectPassword);
        }
        self.store.update_secret(username, new)
    }

    /// Unconditional reset to the logged-out default, discarding every
    /// per-operation flag.
    pub fn logout(&self) {
        info!("logged out");
        let mut state = self.lock_state();
        *state = SessionState::default();
    }

    /// Clear a stale login/register error (e.g. when the user resumes
    /// typing). Touches nothing else.
    pub fn clear_auth_error(&self) {
        let mut state = self.lock_state();
        *state = SessionState {
            auth_error: None,
            ..state.clone()
        };
    }

    pub fn clear_profile_error(&self) {
        let mut state = self.lock_state();
        *state = SessionState {
            profile_error: None,
            ..state.clone()
        };
    }

    /// Clear a stale password error and consume the success flag.
    pub fn clear_password_error(&self) {
        let mut state = self.lock_state();
        *state = SessionState {
            password_error: None,
            password_update_success: false,
            ..state.clone()
        };
    }
}
