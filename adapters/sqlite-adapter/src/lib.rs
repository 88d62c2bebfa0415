//! sqlite-adapter — SQLite implementation of the MappingRepository port.
//!
//! Purpose
//! - Provide the durable, file-based short code → URL table.
//! - Implements the `MappingRepository` trait from the `domain` crate.
//!
//! Notes
//! - Uses `rusqlite` with the `bundled` feature for portability.
//! - One connection is opened per store and held for its lifetime; callers
//!   construct the store once at startup and `close()` it on shutdown.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use domain::{CoreError, MappingRepository, ShortCode, UrlMapping};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

/// Database file used when no path is configured, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "urls.db";

/// SQLite-backed mapping store.
pub struct SqliteRepo {
    conn: Mutex<Connection>,
}

impl SqliteRepo {
    /// Open (or create) a SQLite database at the given path and ensure schema.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(map_sqerr)?;
        init_schema(&conn)?;
        info!(path = %path.display(), "sqlite store opened");
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Close the underlying connection, reporting any error SQLite raises
    /// while flushing. Dropping the store also closes it, silently.
    pub fn close(self) -> Result<(), CoreError> {
        let conn = self
            .conn
            .into_inner()
            .map_err(|_| CoreError::StorageUnavailable("mutex poisoned".into()))?;
        conn.close().map_err(|(_, e)| map_sqerr(e))?;
        info!("sqlite store closed");
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CoreError> {
        self.conn
            .lock()
            .map_err(|_| CoreError::StorageUnavailable("mutex poisoned".into()))
    }
}

fn init_schema(conn: &Connection) -> Result<(), CoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS url_mappings (
            short_code TEXT PRIMARY KEY,
            original_url TEXT NOT NULL
        );
        "#,
    )
    .map_err(map_sqerr)
}

fn map_sqerr<E: std::fmt::Display>(e: E) -> CoreError {
    CoreError::StorageUnavailable(format!("sqlite error: {e}"))
}

impl MappingRepository for SqliteRepo {
    fn get(&self, code: &ShortCode) -> Result<Option<UrlMapping>, CoreError> {
        let conn = self.lock()?;
        let url: Option<String> = conn
            .query_row(
                "SELECT original_url FROM url_mappings WHERE short_code = ?1",
                params![code.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(map_sqerr)?;
        Ok(url.map(|u| UrlMapping::new(code.clone(), u)))
    }

    fn upsert(&self, mapping: &UrlMapping) -> Result<(), CoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO url_mappings (short_code, original_url) VALUES (?1, ?2)
             ON CONFLICT(short_code) DO UPDATE SET original_url = excluded.original_url",
            params![mapping.short_code.as_str(), mapping.original_url],
        )
        .map_err(map_sqerr)?;
        debug!(code = %mapping.short_code, "mapping upserted");
        Ok(())
    }

    fn count(&self) -> Result<usize, CoreError> {
        let conn = self.lock()?;
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM url_mappings", [], |row| row.get(0))
            .map_err(map_sqerr)?;
        Ok(n as usize)
    }
}
