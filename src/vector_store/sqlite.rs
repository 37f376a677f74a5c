//! SQLite-based vector store implementation.
//!
//! Uses SQLite with cosine similarity computed in Rust for simplicity.
//! A personal PDF library stays in the tens of thousands of chunks, where a
//! full scan per query is fast enough.

use super::{rank_documents, Document, IndexedSource, SearchResult, VectorStore};
use crate::error::{FolioError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS documents (
        id TEXT PRIMARY KEY,
        source TEXT NOT NULL,
        chunk_id INTEGER NOT NULL,
        content TEXT NOT NULL,
        embedding BLOB NOT NULL,
        indexed_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_documents_source ON documents(source);
"#;

const SELECT_DOCUMENT: &str =
    "SELECT id, source, chunk_id, content, embedding, indexed_at FROM documents";

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Open (or create) a SQLite vector store at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    #[cfg(test)]
    fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| FolioError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn parse_timestamp(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    fn row_to_document(row: &Row<'_>) -> rusqlite::Result<Document> {
        let id_str: String = row.get(0)?;
        let chunk_id: i64 = row.get(2)?;
        let embedding_bytes: Vec<u8> = row.get(4)?;
        let indexed_at_str: String = row.get(5)?;

        Ok(Document {
            id: uuid::Uuid::parse_str(&id_str).unwrap_or_default(),
            source: row.get(1)?,
            chunk_id: chunk_id.max(0) as usize,
            content: row.get(3)?,
            embedding: Self::bytes_to_embedding(&embedding_bytes),
            indexed_at: Self::parse_timestamp(&indexed_at_str),
        })
    }

    fn row_to_source(row: &Row<'_>) -> rusqlite::Result<IndexedSource> {
        let indexed_at_str: String = row.get(2)?;
        Ok(IndexedSource {
            source: row.get(0)?,
            chunk_count: row.get(1)?,
            indexed_at: Self::parse_timestamp(&indexed_at_str),
        })
    }

    fn insert(conn: &Connection, doc: &Document) -> Result<()> {
        conn.execute(
            r#"
            INSERT OR REPLACE INTO documents (id, source, chunk_id, content, embedding, indexed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                doc.id.to_string(),
                doc.source,
                doc.chunk_id as i64,
                doc.content,
                Self::embedding_to_bytes(&doc.embedding),
                doc.indexed_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, doc))]
    async fn upsert(&self, doc: &Document) -> Result<()> {
        let conn = self.lock()?;
        Self::insert(&conn, doc)?;
        debug!("Upserted document {}", doc.id);
        Ok(())
    }

    #[instrument(skip(self, docs))]
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        for doc in docs {
            Self::insert(&tx, doc)?;
        }

        tx.commit()?;
        info!("Batch upserted {} documents", docs.len());
        Ok(docs.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        self.search_with_threshold(query_embedding, limit, f32::MIN)
            .await
    }

    #[instrument(skip(self, query_embedding))]
    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(SELECT_DOCUMENT)?;
        let docs = stmt
            .query_map([], Self::row_to_document)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let results = rank_documents(docs, query_embedding, limit, min_score);

        debug!("Found {} matching documents", results.len());
        Ok(results)
    }

    #[instrument(skip(self))]
    async fn delete_by_source(&self, source: &str) -> Result<usize> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM documents WHERE source = ?1", params![source])?;

        info!("Deleted {} documents for {}", deleted, source);
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn list_sources(&self) -> Result<Vec<IndexedSource>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT source, COUNT(*) AS chunk_count, MAX(indexed_at) AS indexed_at
            FROM documents
            GROUP BY source
            ORDER BY source
            "#,
        )?;

        let sources = stmt
            .query_map([], Self::row_to_source)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sources)
    }

    #[instrument(skip(self))]
    async fn get_source(&self, source: &str) -> Result<Option<IndexedSource>> {
        let conn = self.lock()?;
        let result = conn.query_row(
            r#"
            SELECT source, COUNT(*) AS chunk_count, MAX(indexed_at) AS indexed_at
            FROM documents
            WHERE source = ?1
            GROUP BY source
            "#,
            params![source],
            Self::row_to_source,
        );

        match result {
            Ok(s) => Ok(Some(s)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn is_source_indexed(&self, source: &str) -> Result<bool> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE source = ?1",
            params![source],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    #[instrument(skip(self))]
    async fn get_by_source(&self, source: &str) -> Result<Vec<Document>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE source = ?1 ORDER BY chunk_id",
            SELECT_DOCUMENT
        ))?;

        let result = stmt
            .query_map(params![source], Self::row_to_document)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        debug!("Found {} documents for {}", result.len(), source);
        Ok(result)
    }

    async fn document_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
