use chrono::Utc;
use group_core::domain::{GroupId, NormalizedGroupRecord};
use group_core::errors::StoreError;
use group_core::ports::RecordStore;
use rusqlite::{params, Connection};
use std::collections::HashSet;
use tracing::debug;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS groups (
        meetup_id   TEXT PRIMARY KEY,
        name        TEXT NOT NULL,
        meetup_url  TEXT NOT NULL,
        country     TEXT NOT NULL,
        imported_at TEXT NOT NULL
    )
"#;

/// SQLite implementation of the RecordStore trait
pub struct SqliteRecordStore {
    db_path: String,
}

impl SqliteRecordStore {
    /// Creates a new SqliteRecordStore with the given database path
    pub fn new(db_path: String) -> Self {
        Self { db_path }
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.db_path).map_err(|e| unavailable(&self.db_path, e))?;
        conn.execute_batch(SCHEMA).map_err(|e| unavailable(&self.db_path, e))?;
        Ok(conn)
    }
}

fn unavailable(db_path: &str, err: rusqlite::Error) -> StoreError {
    StoreError::Unavailable(format!("{db_path}: {err}"))
}

impl RecordStore for SqliteRecordStore {
    fn list_known_identifiers(&self) -> Result<HashSet<GroupId>, StoreError> {
        let conn = self.connect()?;

        let mut stmt = conn
            .prepare("SELECT meetup_id FROM groups")
            .map_err(|e| unavailable(&self.db_path, e))?;

        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| unavailable(&self.db_path, e))?
            .map(|id| id.map(GroupId::new))
            .collect::<Result<HashSet<_>, rusqlite::Error>>()
            .map_err(|e| unavailable(&self.db_path, e))?;

        debug!(db = %self.db_path, count = ids.len(), "listed known identifiers");
        Ok(ids)
    }

    fn append_records(&self, records: &[NormalizedGroupRecord]) -> Result<(), StoreError> {
        let mut conn = self.connect()?;
        let imported_at = Utc::now().to_rfc3339();

        // One transaction for the whole batch; rows already present are left untouched
        let tx = conn.transaction().map_err(|e| unavailable(&self.db_path, e))?;
        let mut inserted = 0;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR IGNORE INTO groups (meetup_id, name, meetup_url, country, imported_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )
                .map_err(|e| unavailable(&self.db_path, e))?;

            for record in records {
                inserted += stmt
                    .execute(params![
                        record.meetup_id.as_str(),
                        record.name,
                        record.meetup_url,
                        record.country,
                        imported_at,
                    ])
                    .map_err(|e| unavailable(&self.db_path, e))?;
            }
        }
        tx.commit().map_err(|e| unavailable(&self.db_path, e))?;

        debug!(db = %self.db_path, inserted, "appended group records");
        Ok(())
    }
}
