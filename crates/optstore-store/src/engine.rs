//! SQLite-backed persistence engine
//!
//! Values are stored as JSON text. Rows written by other tools as plain,
//! non-JSON text are read back as JSON strings; blob values are decoded as
//! lossy UTF-8 first.

use std::path::Path;

use optstore_core::engine::{EngineResult, PersistenceEngine};
use optstore_core::filter::{Filter, SetValues};
use optstore_core::model::{OptionRow, OptionValue, TenantId};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior};

use crate::db;
use crate::errors::{encode_error, from_rusqlite, Result};
use crate::migrations::apply_migrations;

// Ranking shared with MemoryEngine: global rows first, then insertion order
const MATCH_ORDER: &str = "ORDER BY tenant_id IS NOT NULL, id";

/// `PersistenceEngine` over a single SQLite connection
pub struct SqliteEngine {
    conn: Connection,
}

impl SqliteEngine {
    /// Wrap a connection whose schema is already migrated
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Open (or create) a database file, configure it and migrate it
    pub fn open<P: AsRef<Path>>(path: P, busy_timeout_ms: u64) -> Result<Self> {
        let mut conn = db::open(path)?;
        db::configure(&conn, busy_timeout_ms)?;
        apply_migrations(&mut conn)?;
        Ok(Self { conn })
    }

    /// Migrated in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = db::open_in_memory()?;
        db::configure(&conn, db::DEFAULT_BUSY_TIMEOUT_MS)?;
        apply_migrations(&mut conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Every row, oldest first
    pub fn rows(&self) -> Result<Vec<OptionRow>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, key, value, tenant_id FROM options ORDER BY id")
            .map_err(from_rusqlite)?;
        let rows = stmt
            .query_map([], read_row)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        Ok(rows)
    }
}

impl PersistenceEngine for SqliteEngine {
    fn exists(&self, filter: &Filter) -> EngineResult<bool> {
        let found: bool = match filter.tenant_id {
            Some(tenant_id) => self.conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM options WHERE key = ?1 AND tenant_id = ?2)",
                rusqlite::params![filter.key, tenant_id.get()],
                |row| row.get(0),
            ),
            None => self.conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM options WHERE key = ?1)",
                rusqlite::params![filter.key],
                |row| row.get(0),
            ),
        }
        .map_err(from_rusqlite)?;
        Ok(found)
    }

    fn find_one(&self, filter: &Filter) -> EngineResult<Option<OptionRow>> {
        let row = match filter.tenant_id {
            Some(tenant_id) => self.conn.query_row(
                &format!(
                    "SELECT id, key, value, tenant_id FROM options
                     WHERE key = ?1 AND tenant_id = ?2 {} LIMIT 1",
                    MATCH_ORDER
                ),
                rusqlite::params![filter.key, tenant_id.get()],
                read_row,
            ),
            None => self.conn.query_row(
                &format!(
                    "SELECT id, key, value, tenant_id FROM options
                     WHERE key = ?1 {} LIMIT 1",
                    MATCH_ORDER
                ),
                rusqlite::params![filter.key],
                read_row,
            ),
        }
        .optional()
        .map_err(from_rusqlite)?;
        Ok(row)
    }

    fn upsert(&mut self, filter: &Filter, values: &SetValues) -> EngineResult<()> {
        let encoded = serde_json::to_string(&values.value).map_err(|e| encode_error(&filter.key, e))?;

        // IMMEDIATE takes the write lock up front so the select and the
        // write below cannot interleave with another writer
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(from_rusqlite)?;

        let existing: Option<i64> = match filter.tenant_id {
            Some(tenant_id) => tx.query_row(
                &format!(
                    "SELECT id FROM options WHERE key = ?1 AND tenant_id = ?2 {} LIMIT 1",
                    MATCH_ORDER
                ),
                rusqlite::params![filter.key, tenant_id.get()],
                |row| row.get(0),
            ),
            None => tx.query_row(
                &format!("SELECT id FROM options WHERE key = ?1 {} LIMIT 1", MATCH_ORDER),
                rusqlite::params![filter.key],
                |row| row.get(0),
            ),
        }
        .optional()
        .map_err(from_rusqlite)?;

        match (existing, values.tenant_id) {
            (Some(id), Some(tenant_id)) => {
                tx.execute(
                    "UPDATE options SET value = ?1, tenant_id = ?2 WHERE id = ?3",
                    rusqlite::params![encoded, tenant_id.get(), id],
                )
                .map_err(from_rusqlite)?;
            }
            (Some(id), None) => {
                tx.execute(
                    "UPDATE options SET value = ?1 WHERE id = ?2",
                    rusqlite::params![encoded, id],
                )
                .map_err(from_rusqlite)?;
            }
            (None, tenant_id) => {
                let tenant_id = tenant_id.or(filter.tenant_id).map(TenantId::get);
                tx.execute(
                    "INSERT INTO options (key, value, tenant_id) VALUES (?1, ?2, ?3)",
                    rusqlite::params![filter.key, encoded, tenant_id],
                )
                .map_err(from_rusqlite)?;
            }
        }

        tx.commit().map_err(from_rusqlite)?;

        tracing::debug!(
            option_key = %filter.key,
            updated = existing.is_some(),
            "sqlite upsert"
        );
        Ok(())
    }

    fn delete_all(&mut self, filter: &Filter) -> EngineResult<usize> {
        let deleted = match filter.tenant_id {
            Some(tenant_id) => self.conn.execute(
                "DELETE FROM options WHERE key = ?1 AND tenant_id = ?2",
                rusqlite::params![filter.key, tenant_id.get()],
            ),
            None => self.conn.execute(
                "DELETE FROM options WHERE key = ?1",
                rusqlite::params![filter.key],
            ),
        }
        .map_err(from_rusqlite)?;
        Ok(deleted)
    }
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<OptionRow> {
    let raw: SqlValue = row.get(2)?;
    let tenant_id: Option<i64> = row.get(3)?;
    Ok(OptionRow {
        id: row.get(0)?,
        key: row.get(1)?,
        value: decode_value(raw),
        tenant_id: tenant_id.map(TenantId::new),
    })
}

fn decode_value(raw: SqlValue) -> OptionValue {
    let text = match raw {
        SqlValue::Text(text) => text,
        SqlValue::Blob(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        SqlValue::Integer(n) => return OptionValue::from(n),
        SqlValue::Real(n) => return OptionValue::from(n),
        SqlValue::Null => return OptionValue::Null,
    };
    match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(_) => OptionValue::String(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_text_rows_decode_as_strings() {
        let engine = SqliteEngine::open_in_memory().unwrap();
        engine
            .connection()
            .execute(
                "INSERT INTO options (key, value, tenant_id) VALUES ('legacy', 'hello world', NULL)",
                [],
            )
            .unwrap();

        let row = engine
            .find_one(&Filter::new("legacy", None))
            .unwrap()
            .unwrap();
        assert_eq!(row.value, json!("hello world"));
    }

    #[test]
    fn test_blob_rows_decode_lossily() {
        let engine = SqliteEngine::open_in_memory().unwrap();
        let conn = engine.connection();
        conn.execute(
            "INSERT INTO options (key, value, tenant_id) VALUES ('json_blob', ?1, NULL)",
            [br#"{"a":1}"#.to_vec()],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO options (key, value, tenant_id) VALUES ('bad_utf8', ?1, NULL)",
            [vec![b'h', b'i', 0xff]],
        )
        .unwrap();

        let json_blob = engine.find_one(&Filter::new("json_blob", None)).unwrap().unwrap();
        assert_eq!(json_blob.value, json!({"a": 1}));

        let bad = engine.find_one(&Filter::new("bad_utf8", None)).unwrap().unwrap();
        assert_eq!(bad.value, json!("hi\u{fffd}"));
    }

    #[test]
    fn test_values_are_stored_as_json_text() {
        let mut engine = SqliteEngine::open_in_memory().unwrap();
        engine
            .upsert(
                &Filter::new("limits", None),
                &SetValues::new(json!({"max": 3}), None),
            )
            .unwrap();

        let raw: String = engine
            .connection()
            .query_row("SELECT value FROM options WHERE key = 'limits'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(raw, r#"{"max":3}"#);
    }

    #[test]
    fn test_unique_index_rejects_duplicate_scope() {
        let engine = SqliteEngine::open_in_memory().unwrap();
        let conn = engine.connection();
        conn.execute(
            "INSERT INTO options (key, value, tenant_id) VALUES ('k', '1', NULL)",
            [],
        )
        .unwrap();
        let err = conn
            .execute(
                "INSERT INTO options (key, value, tenant_id) VALUES ('k', '2', NULL)",
                [],
            )
            .map_err(from_rusqlite)
            .unwrap_err();
        assert_eq!(err.code(), "ERR_CONSTRAINT_VIOLATION");
    }
}
