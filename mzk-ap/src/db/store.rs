//! Blob store access
//!
//! The engine treats persistent storage as an opaque get/set store of byte
//! blobs keyed by string. Two implementations: SQLite-backed for the
//! application, in-memory for tests and ephemeral sessions.

use crate::error::{Error, Result};
use async_trait::async_trait;
use sqlx::{Pool, Sqlite};
use std::collections::HashMap;
use std::sync::Mutex;

/// Opaque key → bytes store
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read a blob, None when the key was never written
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write (insert or replace) a blob
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;
}

/// SQLite-backed blob store on the `blobs` table
#[derive(Clone)]
pub struct SqliteStore {
    db: Pool<Sqlite>,
}

impl SqliteStore {
    /// Wrap a pool whose schema was created by [`super::init::create_schema`]
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BlobStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value: Option<Vec<u8>> = sqlx::query_scalar("SELECT value FROM blobs WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.db)
            .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO blobs (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.db)
        .await?;

        Ok(())
    }
}

/// In-memory blob store
#[derive(Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|_| Error::Store("memory store lock poisoned".to_string()))?;
        Ok(blobs.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| Error::Store("memory store lock poisoned".to_string()))?;
        blobs.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}
