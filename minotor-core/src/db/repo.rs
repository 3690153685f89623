//! Database repository layer
//!
//! Provides insert and query operations on document collections.

use crate::error::{Error, Result};
use crate::types::{CollectionInfo, StoredDocument};
use chrono::Utc;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Read access to a collection-oriented document store.
///
/// The event repository only ever talks to the store through this trait, so
/// tests can substitute stores that fail on demand.
pub trait DocumentStore: Send + Sync {
    /// Check that the store answers at all
    fn ping(&self) -> Result<()>;

    /// Number of documents in a collection (0 for unknown collections)
    fn count_documents(&self, collection: &str) -> Result<i64>;

    /// Up to `limit` documents of a collection, in insertion order
    fn find_documents(&self, collection: &str, limit: usize) -> Result<Vec<StoredDocument>>;

    /// Every collection holding at least one document
    fn list_collections(&self) -> Result<Vec<CollectionInfo>>;
}

/// Database handle (single connection)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA cache_size = -16000;  -- 16MB cache
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;
        super::schema::run_migrations(&conn)
    }

    /// Get the underlying connection (for advanced use)
    pub fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.lock()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::LockPoisoned)
    }

    // ============================================
    // Document operations
    // ============================================

    /// Insert one JSON object into a collection, returning its row id
    pub fn insert_document(&self, collection: &str, document: &serde_json::Value) -> Result<i64> {
        ensure_object(collection, document)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO documents (collection, body, inserted_at) VALUES (?1, ?2, ?3)",
            params![collection, document.to_string(), Utc::now().to_rfc3339()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Insert multiple documents in a transaction
    ///
    /// Either every document is stored or none is.
    pub fn insert_documents(
        &self,
        collection: &str,
        documents: &[serde_json::Value],
    ) -> Result<usize> {
        for document in documents {
            ensure_object(collection, document)?;
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let inserted_at = Utc::now().to_rfc3339();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO documents (collection, body, inserted_at) VALUES (?1, ?2, ?3)",
            )?;
            for document in documents {
                stmt.execute(params![collection, document.to_string(), inserted_at])?;
            }
        }

        tx.commit()?;
        Ok(documents.len())
    }

    /// Remove every document of a collection, returning how many were deleted
    pub fn clear_collection(&self, collection: &str) -> Result<usize> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM documents WHERE collection = ?", [collection])?;
        Ok(deleted)
    }

    fn row_to_document(row: &Row) -> rusqlite::Result<StoredDocument> {
        Ok(StoredDocument {
            rowid: row.get("id")?,
            collection: row.get("collection")?,
            body: row.get("body")?,
        })
    }
}

impl DocumentStore for Database {
    fn ping(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", [], |r| r.get::<_, i64>(0))?;
        Ok(())
    }

    fn count_documents(&self, collection: &str) -> Result<i64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?",
            [collection],
            |r| r.get(0),
        )?;
        Ok(count)
    }

    fn find_documents(&self, collection: &str, limit: usize) -> Result<Vec<StoredDocument>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, collection, body FROM documents WHERE collection = ? ORDER BY id ASC LIMIT ?",
        )?;

        let documents = stmt
            .query_map(params![collection, limit as i64], Self::row_to_document)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(documents)
    }

    fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT collection, COUNT(*) FROM documents GROUP BY collection ORDER BY collection ASC",
        )?;

        let collections = stmt
            .query_map([], |row| {
                Ok(CollectionInfo {
                    name: row.get(0)?,
                    document_count: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(collections)
    }
}

fn ensure_object(collection: &str, document: &serde_json::Value) -> Result<()> {
    if document.is_object() {
        Ok(())
    } else {
        Err(Error::InvalidDocument {
            collection: collection.to_string(),
            message: "document must be a JSON object".to_string(),
        })
    }
}
