//! Saved report store.
//!
//! Persists named report configurations per organization in a local SQLite
//! database (default `~/.informe/reports.db`). A saved report is immutable
//! once created: it can only be listed, loaded, or deleted - there is no
//! update or rename operation.
//!
//! # Schema note
//!
//! The column holding the configuration is named `filters` for compatibility
//! with previously exported data; it stores the whole [`ReportConfig`] as a
//! JSON blob, not just the filter list.

use std::path::PathBuf;

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::model::ReportConfig;

/// Current store schema version. Bump this when the format changes.
const STORE_VERSION: i32 = 1;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to determine data directory")]
    NoDataDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("saved report name must not be empty")]
    EmptyName,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A persisted report configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedReport {
    pub id: String,
    pub organization_id: String,
    pub user_id: String,
    pub name: String,
    /// The whole configuration. Serialized under the historical name
    /// `filters`.
    #[serde(rename = "filters")]
    pub config: ReportConfig,
    /// Unix seconds.
    pub created_at: i64,
}

/// SQLite-backed saved report store.
pub struct SavedReportStore {
    conn: Connection,
}

impl SavedReportStore {
    /// Open or create the store at the default location.
    pub fn open_default() -> StoreResult<Self> {
        Self::open(Self::default_path()?)
    }

    /// Open or create the store at a specific path.
    pub fn open(path: PathBuf) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    /// Default store location: `~/.informe/reports.db`.
    pub fn default_path() -> StoreResult<PathBuf> {
        let base = dirs::home_dir().ok_or(StoreError::NoDataDir)?;
        Ok(base.join(".informe").join("reports.db"))
    }

    /// Initialize the schema and check the store version.
    fn init(&self) -> StoreResult<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS saved_reports (
                id TEXT PRIMARY KEY,
                organization_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                filters TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_saved_reports_org
                ON saved_reports (organization_id, created_at);

            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;

        let stored_version: Option<i32> = self
            .conn
            .query_row("SELECT value FROM meta WHERE key = 'version'", [], |row| {
                let s: String = row.get(0)?;
                Ok(s.parse().unwrap_or(0))
            })
            .optional()?;

        match stored_version {
            Some(v) if v == STORE_VERSION => {}
            Some(_) => {
                // Version mismatch: the store only ever held recreatable
                // configurations, so clear and restart.
                self.conn.execute("DELETE FROM saved_reports", [])?;
                self.set_version()?;
            }
            None => {
                self.set_version()?;
            }
        }

        Ok(())
    }

    fn set_version(&self) -> StoreResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES ('version', ?)",
            params![STORE_VERSION.to_string()],
        )?;
        Ok(())
    }

    /// Persist a configuration under a name.
    ///
    /// Duplicate names are allowed; the store does not deduplicate.
    pub fn save(
        &self,
        organization_id: &str,
        user_id: &str,
        name: &str,
        config: &ReportConfig,
    ) -> StoreResult<SavedReport> {
        if name.trim().is_empty() {
            return Err(StoreError::EmptyName);
        }

        let saved = SavedReport {
            id: uuid::Uuid::new_v4().to_string(),
            organization_id: organization_id.to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            config: config.clone(),
            created_at: now_unix(),
        };

        let blob = serde_json::to_string(&saved.config)?;
        self.conn.execute(
            "INSERT INTO saved_reports (id, organization_id, user_id, name, filters, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                saved.id,
                saved.organization_id,
                saved.user_id,
                saved.name,
                blob,
                saved.created_at
            ],
        )?;

        Ok(saved)
    }

    /// Load one saved report by id.
    pub fn get(&self, id: &str) -> StoreResult<Option<SavedReport>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, organization_id, user_id, name, filters, created_at
                 FROM saved_reports WHERE id = ?",
                params![id],
                read_row,
            )
            .optional()?;

        match row {
            Some((report, blob)) => Ok(Some(inflate(report, &blob)?)),
            None => Ok(None),
        }
    }

    /// All saved reports of one organization, oldest first.
    pub fn list(&self, organization_id: &str) -> StoreResult<Vec<SavedReport>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, organization_id, user_id, name, filters, created_at
             FROM saved_reports WHERE organization_id = ?
             ORDER BY created_at, rowid",
        )?;

        let rows = stmt
            .query_map(params![organization_id], read_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(report, blob)| inflate(report, &blob))
            .collect()
    }

    /// Delete a saved report.
    ///
    /// Returns `Ok(false)` for an unknown id, so callers stay idempotent.
    pub fn delete(&self, id: &str) -> StoreResult<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM saved_reports WHERE id = ?", params![id])?;
        Ok(rows > 0)
    }
}

/// Row shape before the config blob is parsed.
struct RawReport {
    id: String,
    organization_id: String,
    user_id: String,
    name: String,
    created_at: i64,
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(RawReport, String)> {
    Ok((
        RawReport {
            id: row.get(0)?,
            organization_id: row.get(1)?,
            user_id: row.get(2)?,
            name: row.get(3)?,
            created_at: row.get(5)?,
        },
        row.get(4)?,
    ))
}

fn inflate(raw: RawReport, blob: &str) -> StoreResult<SavedReport> {
    Ok(SavedReport {
        id: raw.id,
        organization_id: raw.organization_id,
        user_id: raw.user_id,
        name: raw.name,
        config: serde_json::from_str(blob)?,
        created_at: raw.created_at,
    })
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
