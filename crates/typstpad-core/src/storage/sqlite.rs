//! SQLite-backed font object store.

use super::traits::FontObjectStore;
use crate::error::{PadError, Result};
use crate::fonts::UploadedFont;
use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

const SELECT_COLUMNS: &str =
    "SELECT id, file_name, family, data, style, weight, added_at, fingerprint FROM fonts";

/// Uploaded font records stored in a single SQLite table.
///
/// Thread-safe via internal mutex on the connection. Queries run on the
/// blocking thread pool so large font blobs never stall the async runtime.
#[derive(Clone)]
pub struct SqliteFontStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteFontStore {
    /// Open (or create) the font database at `db_path`.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PadError::Io {
                message: format!("Failed to create font database directory: {}", e),
                path: Some(parent.to_path_buf()),
                source: Some(e),
            })?;
        }

        let conn = Connection::open(db_path).map_err(|e| PadError::Database {
            message: format!("Failed to open font database: {}", e),
            source: Some(e),
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| PadError::Database {
                message: format!("Failed to set pragmas: {}", e),
                source: Some(e),
            })?;

        Self::with_connection(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS fonts (
                id TEXT PRIMARY KEY,
                file_name TEXT NOT NULL,
                family TEXT NOT NULL,
                data BLOB NOT NULL,
                style TEXT,
                weight INTEGER,
                added_at INTEGER NOT NULL,
                fingerprint TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_fonts_added_at ON fonts(added_at);
            "#,
        )
        .map_err(|e| PadError::Database {
            message: format!("Failed to initialize font schema: {}", e),
            source: Some(e),
        })?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|e| PadError::Database {
                message: format!("Failed to lock database: {}", e),
                source: None,
            })?;
            f(&conn)
        })
        .await
        .map_err(|e| PadError::Other(format!("Font database task failed: {}", e)))?
    }
}

fn row_to_font(row: &Row<'_>) -> rusqlite::Result<UploadedFont> {
    let data: Vec<u8> = row.get(3)?;
    let weight: Option<i64> = row.get(5)?;
    Ok(UploadedFont {
        id: row.get(0)?,
        file_name: row.get(1)?,
        family: row.get(2)?,
        data: Bytes::from(data),
        style: row.get(4)?,
        weight: weight.and_then(|w| u16::try_from(w).ok()),
        added_at: row.get(6)?,
        fingerprint: row.get(7)?,
    })
}

#[async_trait]
impl FontObjectStore for SqliteFontStore {
    async fn get(&self, id: &str) -> Result<Option<UploadedFont>> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let font = conn
                .query_row(
                    &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                    params![id],
                    row_to_font,
                )
                .optional()?;
            Ok(font)
        })
        .await
    }

    async fn put(&self, font: &UploadedFont) -> Result<()> {
        let font = font.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO fonts
                    (id, file_name, family, data, style, weight, added_at, fingerprint)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    font.id,
                    font.file_name,
                    font.family,
                    font.data.as_ref(),
                    font.style,
                    font.weight.map(i64::from),
                    font.added_at,
                    font.fingerprint,
                ],
            )?;
            debug!("Stored font {} ({} bytes)", font.id, font.data.len());
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let removed = conn.execute("DELETE FROM fonts WHERE id = ?1", params![id])?;
            debug!("Deleted {} font record(s) for {}", removed, id);
            Ok(())
        })
        .await
    }

    async fn get_all(&self) -> Result<Vec<UploadedFont>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(SELECT_COLUMNS)?;
            let fonts = stmt
                .query_map([], row_to_font)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(fonts)
        })
        .await
    }
}
