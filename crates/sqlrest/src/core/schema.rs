use std::sync::Arc;

use rusqlite::Connection;

use crate::core::bind::QueryDescriptor;
use crate::error::AppResult;

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS "user" (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS preference (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT UNIQUE NOT NULL,
    value TEXT NOT NULL
);
"#;

/// Canned statements behind one table's list/create routes.
#[derive(Debug, Clone)]
pub struct TableQueries {
    pub list: Arc<QueryDescriptor>,
    pub insert: Arc<QueryDescriptor>,
}

impl TableQueries {
    pub fn users() -> Self {
        Self {
            list: Arc::new(QueryDescriptor::new(r#"SELECT * FROM "user""#)),
            insert: Arc::new(QueryDescriptor::new(
                r#"INSERT INTO "user" (name) VALUES (:name) RETURNING id"#,
            )),
        }
    }

    pub fn prefs() -> Self {
        Self {
            list: Arc::new(QueryDescriptor::new("SELECT * FROM preference")),
            insert: Arc::new(QueryDescriptor::new(
                "INSERT INTO preference (name, value) VALUES (:name, :value) RETURNING id",
            )),
        }
    }

    pub fn statements(&self) -> [&Arc<QueryDescriptor>; 2] {
        [&self.list, &self.insert]
    }
}

/// Creates any missing tables and returns the tables present afterwards.
pub fn init(conn: &Connection) -> AppResult<Vec<String>> {
    conn.execute_batch(SCHEMA)?;
    list_tables(conn)
}

pub fn list_tables(conn: &Connection) -> AppResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let rows = stmt
        .query_map([], |r| r.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
