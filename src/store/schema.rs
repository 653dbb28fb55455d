//! SQLite DDL for the cache and history tables.
//!
//! All statements use `IF NOT EXISTS`, so [`apply_schema`] is idempotent.

use rusqlite::Connection;

/// Complete DDL for the seedfind database.
pub(crate) const SCHEMA_SQL: &str = r#"
-- Enable WAL mode for concurrent reads during writes.
PRAGMA journal_mode = WAL;

-- One row per normalised query; query_hash is the only lookup key.
CREATE TABLE IF NOT EXISTS search_cache (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    query_hash TEXT NOT NULL UNIQUE,
    query      TEXT NOT NULL,
    results    TEXT NOT NULL,          -- JSON array of ResultItem
    created_at INTEGER NOT NULL,
    expires_at INTEGER NOT NULL
);

-- Append-only audit of fresh searches.
CREATE TABLE IF NOT EXISTS search_history (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    query           TEXT NOT NULL,
    results_count   INTEGER NOT NULL,
    processing_time REAL NOT NULL,     -- seconds
    created_at      INTEGER NOT NULL
);

-- Retention queries only.
CREATE INDEX IF NOT EXISTS idx_history_created_at ON search_history(created_at);
"#;

/// Apply the full schema to an open connection.
pub(crate) fn apply_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(conn: &Connection, kind: &str) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type = ?1 ORDER BY name")
            .expect("prepare")
            .query_map([kind], |row| row.get(0))
            .expect("query")
            .filter_map(|r| r.ok())
            .collect()
    }

    #[test]
    fn apply_schema_creates_tables_and_index() {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        apply_schema(&conn).expect("apply_schema");

        let tables = names(&conn, "table");
        assert!(tables.contains(&"search_cache".to_owned()));
        assert!(tables.contains(&"search_history".to_owned()));
        assert!(names(&conn, "index").contains(&"idx_history_created_at".to_owned()));
    }

    #[test]
    fn apply_schema_is_idempotent() {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        apply_schema(&conn).expect("first apply_schema");
        apply_schema(&conn).expect("second apply_schema (idempotent)");
    }

    #[test]
    fn query_hash_is_unique() {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        apply_schema(&conn).expect("apply_schema");
        let insert = "INSERT INTO search_cache (query_hash, query, results, created_at, expires_at) \
                      VALUES ('h', 'q', '[]', 0, 1)";
        conn.execute(insert, []).expect("first insert");
        assert!(conn.execute(insert, []).is_err());
    }
}
