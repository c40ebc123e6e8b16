//! Migration runner
//!
//! Applies migrations in order, records a checksum per migration and
//! refuses to run against a database whose recorded checksum disagrees with
//! the embedded script.

use crate::errors::{checksum_mismatch, from_rusqlite, migration_error, Result};
use crate::migrations::checksums::compute_checksum;
use crate::migrations::embedded::get_migrations;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior};

/// A row of `schema_version`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub migration_id: String,
    pub applied_at: i64,
    pub checksum: Option<String>,
}

/// Apply all pending migrations, returning the ids applied by this call
///
/// Safe to call from several connections at once: each migration is checked
/// and applied under the database write lock.
pub fn apply_migrations(conn: &mut Connection) -> Result<Vec<String>> {
    let mut applied = Vec::new();
    for migration in get_migrations() {
        if apply_migration(conn, migration.id, migration.sql)? {
            applied.push(migration.id.to_string());
        }
    }

    if !applied.is_empty() {
        tracing::debug!(applied = ?applied, "migrations applied");
    }
    Ok(applied)
}

/// Migrations recorded in `schema_version`, oldest first
pub fn applied_migrations(conn: &Connection) -> Result<Vec<AppliedMigration>> {
    create_schema_version_table(conn)?;

    let mut stmt = conn
        .prepare("SELECT migration_id, applied_at, checksum FROM schema_version ORDER BY id")
        .map_err(from_rusqlite)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(AppliedMigration {
                migration_id: row.get(0)?,
                applied_at: row.get(1)?,
                checksum: row.get(2)?,
            })
        })
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;
    Ok(rows)
}

fn create_schema_version_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY,
            migration_id TEXT NOT NULL UNIQUE,
            applied_at INTEGER NOT NULL,
            checksum TEXT
        )",
        [],
    )
    .map_err(from_rusqlite)?;

    Ok(())
}

/// Apply one migration; `Ok(false)` when it was already applied
fn apply_migration(conn: &mut Connection, migration_id: &str, sql: &str) -> Result<bool> {
    let checksum = compute_checksum(sql);

    // Lock first, then look: a concurrent opener waits here and then sees
    // the row this one records
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(from_rusqlite)?;

    create_schema_version_table(&tx)?;

    let recorded: Option<Option<String>> = tx
        .query_row(
            "SELECT checksum FROM schema_version WHERE migration_id = ?",
            [migration_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(from_rusqlite)?;

    match recorded {
        Some(Some(existing)) if existing != checksum => {
            return Err(checksum_mismatch(migration_id, &existing, &checksum));
        }
        Some(_) => return Ok(false),
        None => {}
    }

    tx.execute_batch(sql)
        .map_err(|e| migration_error(migration_id, &e.to_string()))?;

    let now = chrono::Utc::now().timestamp();
    tx.execute(
        "INSERT INTO schema_version (migration_id, applied_at, checksum) VALUES (?, ?, ?)",
        rusqlite::params![migration_id, now, checksum],
    )
    .map_err(from_rusqlite)?;

    tx.commit().map_err(from_rusqlite)?;

    Ok(true)
}
