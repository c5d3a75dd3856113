//! Persistent vector index over the statute corpus.
//!
//! The index is a SQLite database inside a dedicated directory. Presence of
//! that directory is the sole signal that a previously persisted index can
//! be loaded — the dominant path after the first run, performing no
//! re-chunking and no embedding calls.
//!
//! Construction embeds chunks in strictly sequential batches (the provider
//! caps items-per-call; sequential merging also bounds peak memory and lets
//! progress be reported per batch). The build happens in a `.partial`
//! sibling directory that is renamed to the final path only after every
//! batch has been embedded and stored, so a failed build never leaves a
//! half-populated index that a later run would mistake for a complete one.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::sync::Mutex;

use crate::chunk::split_units;
use crate::embedding::{self, Embedder};
use crate::error::CorpusError;
use crate::models::{Chunk, ScoredChunk, TextUnit};
use crate::progress::{BuildEvent, BuildProgressReporter};

const INDEX_DB_FILE: &str = "index.sqlite";

/// At most one index build may run process-wide; loads are unrestricted.
static BUILD_GUARD: Mutex<()> = Mutex::const_new(());

/// Read-only handle to the persisted index. Cheap to share behind an
/// `Arc`; queries never mutate it.
#[derive(Debug)]
pub struct VectorIndex {
    pool: SqlitePool,
    chunk_count: usize,
}

impl VectorIndex {
    /// Whether a persisted index exists at `storage_dir`.
    pub fn exists(storage_dir: &Path) -> bool {
        storage_dir.is_dir()
    }

    /// Load the index at `storage_dir`, or build it from `units` when the
    /// directory is absent. A successful build is persisted before this
    /// returns; a failed build persists nothing.
    pub async fn build_or_load(
        units: &[TextUnit],
        storage_dir: &Path,
        chunk_size: usize,
        chunk_overlap: usize,
        batch_size: usize,
        embedder: &dyn Embedder,
        progress: &dyn BuildProgressReporter,
    ) -> Result<Self, CorpusError> {
        if Self::exists(storage_dir) {
            return Self::open(storage_dir).await;
        }

        let _guard = BUILD_GUARD.lock().await;
        // A concurrent caller may have finished the build while this one
        // waited on the guard.
        if Self::exists(storage_dir) {
            return Self::open(storage_dir).await;
        }

        Self::build(
            units,
            storage_dir,
            chunk_size,
            chunk_overlap,
            batch_size,
            embedder,
            progress,
        )
        .await?;

        Self::open(storage_dir).await
    }

    /// Open a previously persisted index.
    pub async fn open(storage_dir: &Path) -> Result<Self, CorpusError> {
        let db_path = storage_dir.join(INDEX_DB_FILE);
        if !db_path.exists() {
            return Err(CorpusError::IndexBuild(format!(
                "persisted index at {} has no {}",
                storage_dir.display(),
                INDEX_DB_FILE
            )));
        }

        let pool = connect(&db_path, false).await?;

        let chunk_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&pool)
            .await
            .map_err(|e| CorpusError::IndexBuild(e.to_string()))?;

        tracing::info!(chunks = chunk_count, path = %storage_dir.display(), "loaded vector index");

        Ok(Self {
            pool,
            chunk_count: chunk_count as usize,
        })
    }

    async fn build(
        units: &[TextUnit],
        storage_dir: &Path,
        chunk_size: usize,
        chunk_overlap: usize,
        batch_size: usize,
        embedder: &dyn Embedder,
        progress: &dyn BuildProgressReporter,
    ) -> Result<(), CorpusError> {
        let chunks = split_units(units, chunk_size, chunk_overlap);
        if chunks.is_empty() {
            return Err(CorpusError::IndexBuild(
                "source document produced no chunks".to_string(),
            ));
        }

        let partial_dir = partial_path(storage_dir);
        // A leftover partial directory from a crashed build is stale.
        if partial_dir.exists() {
            std::fs::remove_dir_all(&partial_dir)
                .map_err(|e| CorpusError::IndexBuild(e.to_string()))?;
        }
        std::fs::create_dir_all(&partial_dir)
            .map_err(|e| CorpusError::IndexBuild(e.to_string()))?;

        let result = Self::populate(
            &partial_dir,
            &chunks,
            batch_size,
            embedder,
            progress,
        )
        .await;

        if let Err(e) = result {
            let _ = std::fs::remove_dir_all(&partial_dir);
            return Err(e);
        }

        std::fs::rename(&partial_dir, storage_dir).map_err(|e| {
            let _ = std::fs::remove_dir_all(&partial_dir);
            CorpusError::IndexBuild(format!("persist to {}: {}", storage_dir.display(), e))
        })?;

        tracing::info!(chunks = chunks.len(), path = %storage_dir.display(), "vector index built");
        Ok(())
    }

    async fn populate(
        partial_dir: &Path,
        chunks: &[Chunk],
        batch_size: usize,
        embedder: &dyn Embedder,
        progress: &dyn BuildProgressReporter,
    ) -> Result<(), CorpusError> {
        let pool = connect(&partial_dir.join(INDEX_DB_FILE), true).await?;
        let result = Self::populate_pool(&pool, chunks, batch_size, embedder, progress).await;
        pool.close().await;
        result
    }

    async fn populate_pool(
        pool: &SqlitePool,
        chunks: &[Chunk],
        batch_size: usize,
        embedder: &dyn Embedder,
        progress: &dyn BuildProgressReporter,
    ) -> Result<(), CorpusError> {
        create_schema(pool).await?;

        let total_batches = chunks.len().div_ceil(batch_size);

        // The first batch initializes the index; each later batch is
        // embedded independently and merged in. Batch n+1 never starts
        // before batch n is stored, keeping merge order deterministic.
        for (i, batch) in chunks.chunks(batch_size).enumerate() {
            progress.report(BuildEvent::Embedding {
                n: i + 1,
                total: total_batches,
                chunks: chunks.len(),
            });

            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = embedder
                .embed(&texts)
                .await
                .map_err(|e| CorpusError::IndexBuild(format!("batch {}: {}", i + 1, e)))?;

            if vectors.len() != batch.len() {
                return Err(CorpusError::IndexBuild(format!(
                    "batch {}: expected {} vectors, got {}",
                    i + 1,
                    batch.len(),
                    vectors.len()
                )));
            }

            let mut tx = pool
                .begin()
                .await
                .map_err(|e| CorpusError::IndexBuild(e.to_string()))?;

            for (chunk, vector) in batch.iter().zip(vectors.iter()) {
                sqlx::query(
                    "INSERT INTO chunks (id, page, chunk_index, text, hash) VALUES (?, ?, ?, ?, ?)",
                )
                .bind(&chunk.id)
                .bind(chunk.page)
                .bind(chunk.chunk_index)
                .bind(&chunk.text)
                .bind(&chunk.hash)
                .execute(&mut *tx)
                .await
                .map_err(|e| CorpusError::IndexBuild(e.to_string()))?;

                sqlx::query("INSERT INTO chunk_vectors (chunk_id, embedding) VALUES (?, ?)")
                    .bind(&chunk.id)
                    .bind(embedding::vec_to_blob(vector))
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| CorpusError::IndexBuild(e.to_string()))?;
            }

            tx.commit()
                .await
                .map_err(|e| CorpusError::IndexBuild(e.to_string()))?;

            tracing::debug!(batch = i + 1, total = total_batches, "embedded batch");
        }

        let now = chrono::Utc::now().timestamp();
        for (key, value) in [
            ("model", embedder.model_name().to_string()),
            ("dims", embedder.dims().to_string()),
            ("built_at", now.to_string()),
            ("chunk_count", chunks.len().to_string()),
        ] {
            sqlx::query("INSERT INTO index_meta (key, value) VALUES (?, ?)")
                .bind(key)
                .bind(value)
                .execute(pool)
                .await
                .map_err(|e| CorpusError::IndexBuild(e.to_string()))?;
        }

        Ok(())
    }

    /// Top-`k` chunks by cosine similarity to `text`, ranked descending.
    /// `k` is capped at the total chunk count. Pure read; safe to call
    /// concurrently from multiple sessions.
    pub async fn query(
        &self,
        embedder: &dyn Embedder,
        text: &str,
        k: usize,
    ) -> anyhow::Result<Vec<ScoredChunk>> {
        let k = k.min(self.chunk_count);
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_vec = embedding::embed_query(embedder, text).await?;

        let rows = sqlx::query(
            r#"
            SELECT c.id, c.page, c.chunk_index, c.text, c.hash, v.embedding
            FROM chunks c
            JOIN chunk_vectors v ON v.chunk_id = c.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut scored: Vec<ScoredChunk> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let vec = embedding::blob_to_vec(&blob);
                let score = embedding::cosine_similarity(&query_vec, &vec);
                ScoredChunk {
                    chunk: Chunk {
                        id: row.get("id"),
                        page: row.get("page"),
                        chunk_index: row.get("chunk_index"),
                        text: row.get("text"),
                        hash: row.get("hash"),
                    },
                    score,
                }
            })
            .collect();

        // Score desc, then (page, chunk_index) asc so equal scores rank
        // deterministically.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.chunk.page.cmp(&b.chunk.page))
                .then(a.chunk.chunk_index.cmp(&b.chunk.chunk_index))
        });
        scored.truncate(k);

        Ok(scored)
    }

    pub fn len(&self) -> usize {
        self.chunk_count
    }

    pub fn is_empty(&self) -> bool {
        self.chunk_count == 0
    }
}

fn partial_path(storage_dir: &Path) -> PathBuf {
    let mut name = storage_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "index".to_string());
    name.push_str(".partial");
    storage_dir.with_file_name(name)
}

async fn connect(db_path: &Path, create: bool) -> Result<SqlitePool, CorpusError> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))
        .map_err(|e| CorpusError::IndexBuild(e.to_string()))?
        .create_if_missing(create)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(|e| CorpusError::IndexBuild(e.to_string()))
}

async fn create_schema(pool: &SqlitePool) -> Result<(), CorpusError> {
    for ddl in [
        r#"
        CREATE TABLE IF NOT EXISTS chunks (
            id TEXT PRIMARY KEY,
            page INTEGER NOT NULL,
            chunk_index INTEGER NOT NULL,
            text TEXT NOT NULL,
            hash TEXT NOT NULL,
            UNIQUE(page, chunk_index)
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS chunk_vectors (
            chunk_id TEXT PRIMARY KEY,
            embedding BLOB NOT NULL,
            FOREIGN KEY (chunk_id) REFERENCES chunks(id)
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS index_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    ] {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(|e| CorpusError::IndexBuild(e.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_path_is_sibling() {
        let p = partial_path(Path::new("/data/vector_store"));
        assert_eq!(p, PathBuf::from("/data/vector_store.partial"));
    }

    #[tokio::test]
    async fn test_open_missing_dir_is_index_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = VectorIndex::open(&dir.path().join("absent")).await.unwrap_err();
        assert!(matches!(err, CorpusError::IndexBuild(_)));
    }

    #[test]
    fn test_exists_only_for_directories() {
        let dir = tempfile::tempdir().unwrap();
        assert!(VectorIndex::exists(dir.path()));
        assert!(!VectorIndex::exists(&dir.path().join("absent")));
    }
}
