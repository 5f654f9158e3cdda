use rusqlite::Connection;

use super::error::StorageError;

pub const KV_ENTRIES_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv_entries (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

pub fn init_database(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(KV_ENTRIES_TABLE_SCHEMA)?;
    Ok(())
}
