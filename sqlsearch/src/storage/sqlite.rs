//! SQLite document store

use std::path::Path;

use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;
use tracing::debug;

use super::{DocumentStore, Row, ScalarValue, TEMPLATES_TABLE};
use crate::plan::sql::quote_ident;
use crate::templates::TemplateMapping;
use crate::{Error, Result};

/// Path that selects an in-memory database
pub const MEMORY_PATH: &str = ":memory:";

/// SQLite-backed [`DocumentStore`]. One connection, serialized by a mutex.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str() == MEMORY_PATH {
            return Self::in_memory();
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Storage(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA cache_size=-64000;
             PRAGMA temp_store=MEMORY;",
        )?;
        debug!("Opened SQLite database at {}", path.display());
        Self::init(conn)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA temp_store=MEMORY;")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    target        TEXT NOT NULL,
                    index_pattern TEXT NOT NULL,
                    body          TEXT NOT NULL
                )",
                quote_ident(TEMPLATES_TABLE)
            ),
            [],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn scalar(value: ValueRef<'_>) -> ScalarValue {
    match value {
        ValueRef::Null => ScalarValue::Null,
        ValueRef::Integer(i) => ScalarValue::Integer(i),
        ValueRef::Real(f) => ScalarValue::Float(f),
        ValueRef::Text(t) | ValueRef::Blob(t) => {
            ScalarValue::Text(String::from_utf8_lossy(t).into_owned())
        }
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn execute(&self, sql: &str) -> Result<Vec<Row>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut columns = Vec::with_capacity(names.len());
            for (i, name) in names.iter().enumerate() {
                columns.push((name.clone(), scalar(row.get_ref(i)?)));
            }
            out.push(Row::new(columns));
        }
        Ok(out)
    }

    async fn insert(&self, table: &str, document: &str) -> Result<i64> {
        let conn = self.conn.lock().await;
        conn.execute(
            &format!("INSERT INTO {} (content) VALUES (json(?1))", quote_ident(table)),
            params![document],
        )?;
        Ok(conn.last_insert_rowid())
    }

    async fn table_exists(&self, table: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![table],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    async fn create_table(&self, table: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (content TEXT NOT NULL)",
                quote_ident(table)
            ),
            [],
        )?;
        Ok(())
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' AND name != ?1
             ORDER BY name",
        )?;
        let names = stmt
            .query_map(params![TEMPLATES_TABLE], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    async fn count(&self, table: &str) -> Result<u64> {
        let conn = self.conn.lock().await;
        let n: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
            [],
            |row| row.get(0),
        )?;
        Ok(n.max(0) as u64)
    }

    async fn load_templates(&self) -> Result<Vec<(String, TemplateMapping)>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT target, index_pattern, body FROM {} ORDER BY rowid",
            quote_ident(TEMPLATES_TABLE)
        ))?;
        let stored = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        stored
            .into_iter()
            .map(|(target, pattern, body)| {
                let properties = serde_json::from_str(&body).map_err(|e| {
                    Error::Storage(format!("template '{}' has a corrupt body: {}", target, e))
                })?;
                Ok((target, TemplateMapping::new(pattern, properties)))
            })
            .collect()
    }

    async fn save_template(&self, name: &str, mapping: &TemplateMapping) -> Result<()> {
        let body = serde_json::to_string(&mapping.properties)
            .map_err(|e| Error::Storage(e.to_string()))?;

        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let updated = tx.execute(
            &format!(
                "UPDATE {} SET index_pattern = ?2, body = json(?3) WHERE target = ?1",
                quote_ident(TEMPLATES_TABLE)
            ),
            params![name, mapping.index_patterns, body],
        )?;
        if updated == 0 {
            tx.execute(
                &format!(
                    "INSERT INTO {} (target, index_pattern, body) VALUES (?1, ?2, json(?3))",
                    quote_ident(TEMPLATES_TABLE)
                ),
                params![name, mapping.index_patterns, body],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}
