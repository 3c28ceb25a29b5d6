use super::schema::SCHEMA;
use rusqlite::{Connection, Result};

/// Apply the single-version schema. Idempotent: every statement is
/// `IF NOT EXISTS`, so re-running on an existing database is a no-op.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}
