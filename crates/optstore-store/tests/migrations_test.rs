// Integration tests for the migration framework

use optstore_store::migrations::{applied_migrations, apply_migrations, compute_checksum, get_migrations};
use rusqlite::Connection;

fn setup_test_db() -> Connection {
    Connection::open_in_memory().expect("Failed to create in-memory database")
}

fn get_table_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap()
}

fn get_index_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = 'options'")
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap()
}

#[test]
fn test_apply_migrations_on_empty_db() {
    // Given: An empty SQLite database
    let mut conn = setup_test_db();

    // When: Migrations are applied
    let result = apply_migrations(&mut conn);

    // Then: The options table and its scope indexes exist
    assert!(result.is_ok(), "Migrations should succeed: {:?}", result.err());

    let tables = get_table_names(&conn);
    for expected in ["options", "schema_version", "sqlite_sequence"] {
        assert!(tables.contains(&expected.to_string()), "Missing table: {}", expected);
    }

    let indexes = get_index_names(&conn);
    assert!(indexes.contains(&"idx_options_key_tenant".to_string()));
    assert!(indexes.contains(&"idx_options_key_global".to_string()));
}

#[test]
fn test_checksums_are_recorded() {
    let mut conn = setup_test_db();
    apply_migrations(&mut conn).unwrap();

    let applied = applied_migrations(&conn).unwrap();
    let embedded = get_migrations();
    assert_eq!(applied.len(), embedded.len());

    for (row, migration) in applied.iter().zip(embedded.iter()) {
        assert_eq!(row.migration_id, migration.id);
        assert_eq!(row.checksum.as_deref(), Some(compute_checksum(migration.sql).as_str()));
        assert!(row.applied_at > 0);
    }
}

#[test]
fn test_reapplying_is_a_no_op() {
    let mut conn = setup_test_db();
    apply_migrations(&mut conn).unwrap();
    conn.execute(
        "INSERT INTO options (key, value, tenant_id) VALUES ('kept', '1', NULL)",
        [],
    )
    .unwrap();

    let second = apply_migrations(&mut conn).unwrap();

    assert!(second.is_empty());
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM options", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1, "Existing rows must survive a re-run");
}

#[test]
fn test_tampered_checksum_is_detected() {
    // Given: A migrated database whose recorded checksum was altered
    let mut conn = setup_test_db();
    apply_migrations(&mut conn).unwrap();
    conn.execute(
        "UPDATE schema_version SET checksum = 'deadbeef' WHERE migration_id = '001_options'",
        [],
    )
    .unwrap();

    // When: Migrations run again
    let err = apply_migrations(&mut conn).unwrap_err();

    // Then: The mismatch is reported
    assert_eq!(err.code(), "ERR_MIGRATION");
    assert!(err.message().contains("001_options"));
}
