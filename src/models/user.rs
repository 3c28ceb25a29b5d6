use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result};

/// One row of the `users` table. The username is the primary key; renaming
/// a user replaces the key. The secret is stored as given and compared for
/// exact equality — no hashing (known weakness, kept for parity with the
/// registration flow the dashboard teaches).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub email: String,
    pub password_secret: String,
    pub display_name: String,
    pub registered_at_millis: i64,
}

const COLUMNS: &str = "username, email, password_secret, display_name, registered_at_millis";

impl User {
    /// Build a registration record. The display name defaults to the
    /// username and the registration timestamp is taken now.
    pub fn new(username: &str, email: &str, password_secret: &str) -> Self {
        Self {
            username: username.to_string(),
            email: email.to_string(),
            password_secret: password_secret.to_string(),
            display_name: username.to_string(),
            registered_at_millis: Utc::now().timestamp_millis(),
        }
    }

    /// Insert this record. Aborts with a constraint violation if the
    /// username or email already exists — never overwrites.
    pub fn insert(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO users (username, email, password_secret, display_name, registered_at_millis)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                self.username,
                self.email,
                self.password_secret,
                self.display_name,
                self.registered_at_millis,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_username(conn: &Connection, username: &str) -> Result<Option<Self>> {
        conn.query_row(
            &format!("SELECT {COLUMNS} FROM users WHERE username = ?1 LIMIT 1"),
            params![username],
            Self::from_row,
        )
        .optional()
    }

    pub fn find_by_email(conn: &Connection, email: &str) -> Result<Option<Self>> {
        conn.query_row(
            &format!("SELECT {COLUMNS} FROM users WHERE email = ?1 LIMIT 1"),
            params![email],
            Self::from_row,
        )
        .optional()
    }

    /// Replace the primary key. Fails with a constraint violation if the
    /// new username is already taken.
    pub fn update_username(conn: &Connection, old: &str, new: &str) -> Result<usize> {
        conn.execute(
            "UPDATE users SET username = ?1 WHERE username = ?2",
            params![new, old],
        )
    }

    pub fn update_password(conn: &Connection, username: &str, secret: &str) -> Result<usize> {
        conn.execute(
            "UPDATE users SET password_secret = ?1 WHERE username = ?2",
            params![secret, username],
        )
    }

    pub fn update_email(conn: &Connection, username: &str, email: &str) -> Result<usize> {
        conn.execute(
            "UPDATE users SET email = ?1 WHERE username = ?2",
            params![email, username],
        )
    }

    fn from_row(row: &rusqlite::Row<'_>) -> Result<Self> {
        Ok(Self {
            username: row.get(0)?,
            email: row.get(1)?,
            password_secret: row.get(2)?,
            display_name: row.get(3)?,
            registered_at_millis: row.get(4)?,
        })
    }
}
