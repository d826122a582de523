//! Datastore boundary - the single I/O seam of the execution engine.
//!
//! The engine issues exactly one fetch per execution: no pagination beyond
//! the compiled limit and no retry. A failed fetch surfaces immediately;
//! a blind retry could show partial or duplicated financial-looking data,
//! which is worse than a visible failure.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde_json::Value;

use crate::sql::CompiledQuery;

/// One fetched row: column name to dynamic cell value.
pub type Row = serde_json::Map<String, Value>;

/// Error from the datastore while fetching rows.
#[derive(Debug, thiserror::Error)]
pub enum DatastoreError {
    #[error("datastore rejected the query: {0}")]
    Backend(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type DatastoreResult<T> = Result<T, DatastoreError>;

/// Read access to the tabular collections behind the source catalog.
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Fetch the rows matched by a compiled query. Single request.
    async fn fetch(&self, query: &CompiledQuery) -> DatastoreResult<Vec<Row>>;
}

/// Datastore over a local SQLite database.
///
/// The compiled query renders to one SELECT statement. The connection is
/// mutex-wrapped so the store can be shared across tasks.
pub struct SqliteDatastore {
    conn: Mutex<Connection>,
}

impl SqliteDatastore {
    pub fn open<P: AsRef<Path>>(path: P) -> DatastoreResult<Self> {
        Ok(Self::from_connection(Connection::open(path)?))
    }

    /// In-memory database, for tests and fixtures.
    pub fn open_in_memory() -> DatastoreResult<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    /// Wrap an existing connection (e.g. one with fixtures already loaded).
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Run a batch of SQL statements, e.g. to load fixtures.
    pub fn execute_batch(&self, sql: &str) -> DatastoreResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql)?;
        Ok(())
    }

    fn lock(&self) -> DatastoreResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| DatastoreError::Backend("connection mutex poisoned".to_string()))
    }
}

#[async_trait]
impl Datastore for SqliteDatastore {
    async fn fetch(&self, query: &CompiledQuery) -> DatastoreResult<Vec<Row>> {
        let conn = self.lock()?;
        let sql = query.to_sql();

        let mut stmt = conn.prepare(&sql)?;
        let column_names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();

        let mut rows = Vec::new();
        let mut raw = stmt.query([])?;
        while let Some(sql_row) = raw.next()? {
            let mut row = Row::new();
            for (i, name) in column_names.iter().enumerate() {
                row.insert(name.clone(), cell_to_json(sql_row.get_ref(i)?));
            }
            rows.push(row);
        }

        Ok(rows)
    }
}

fn cell_to_json(cell: ValueRef<'_>) -> Value {
    match cell {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        // Whole reals read back as integers so `10.0` exports as `10`.
        ValueRef::Real(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            Value::from(f as i64)
        }
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        // Binary columns are not reportable.
        ValueRef::Blob(_) => Value::Null,
    }
}
