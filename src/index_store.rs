//! Durable storage for [`CorpusIndex`].
//!
//! An index directory holds one SQLite file, `index.sqlite`:
//!
//! ```text
//! manifest(key TEXT PRIMARY KEY, value TEXT)      model, dims, document_count, created_at
//! entries(position INTEGER PRIMARY KEY,
//!         content TEXT, metadata_json TEXT, vector BLOB)
//! ```
//!
//! Vectors are little-endian `f32` BLOBs. [`persist`] writes to a temporary
//! file and renames it over the previous index, so readers never see a
//! partially written index.

use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use coverage_harness_core::embedding::{blob_to_vec, vec_to_blob};
use coverage_harness_core::{
    CorpusIndex, Document, Embedder, Error, IndexEntry, Metadata, Result,
};

use crate::db;

pub const INDEX_FILE: &str = "index.sqlite";

pub fn index_file(dir: &Path) -> PathBuf {
    dir.join(INDEX_FILE)
}

async fn create_schema(pool: &SqlitePool) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS manifest (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS entries (
            position INTEGER PRIMARY KEY,
            content TEXT NOT NULL,
            metadata_json TEXT NOT NULL,
            vector BLOB NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Write `index` to `dir/index.sqlite`, replacing any previous index.
pub async fn persist(index: &CorpusIndex, dir: &Path) -> Result<()> {
    let fail = |reason: String| Error::IndexPersist {
        path: dir.to_path_buf(),
        reason,
    };

    std::fs::create_dir_all(dir).map_err(|e| fail(e.to_string()))?;
    let target = index_file(dir);
    let tmp = dir.join(format!("{}.tmp", INDEX_FILE));
    if tmp.exists() {
        std::fs::remove_file(&tmp).map_err(|e| fail(e.to_string()))?;
    }

    write_database(index, &tmp)
        .await
        .map_err(|e| fail(e.to_string()))?;
    std::fs::rename(&tmp, &target).map_err(|e| fail(e.to_string()))?;

    tracing::info!(
        path = %target.display(),
        documents = index.len(),
        model = index.model_name(),
        "persisted index"
    );
    Ok(())
}

async fn write_database(index: &CorpusIndex, path: &Path) -> sqlx::Result<()> {
    let pool = db::connect(path, true).await?;
    create_schema(&pool).await?;

    let mut tx = pool.begin().await?;
    let manifest = [
        ("model", index.model_name().to_string()),
        ("dims", index.dims().to_string()),
        ("document_count", index.len().to_string()),
        ("created_at", chrono::Utc::now().to_rfc3339()),
    ];
    for (key, value) in manifest {
        sqlx::query("INSERT OR REPLACE INTO manifest (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await?;
    }

    for (position, entry) in index.entries().iter().enumerate() {
        let metadata_json = serde_json::to_string(entry.document.metadata())
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        sqlx::query(
            "INSERT INTO entries (position, content, metadata_json, vector) VALUES (?, ?, ?, ?)",
        )
        .bind(position as i64)
        .bind(entry.document.content())
        .bind(metadata_json)
        .bind(vec_to_blob(&entry.vector))
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    pool.close().await;
    Ok(())
}

/// Read the index persisted in `dir`.
pub async fn load(dir: &Path) -> Result<CorpusIndex> {
    let path = index_file(dir);
    if !path.is_file() {
        return Err(Error::IndexNotFound {
            path: dir.to_path_buf(),
        });
    }

    let pool = db::connect(&path, false)
        .await
        .map_err(|e| Error::corrupt_index(dir, e))?;
    let result = read_database(&pool, dir).await;
    pool.close().await;
    result
}

async fn read_database(pool: &SqlitePool, dir: &Path) -> Result<CorpusIndex> {
    let corrupt = |reason: String| Error::corrupt_index(dir, reason);

    let mut manifest = HashMap::new();
    for row in sqlx::query("SELECT key, value FROM manifest")
        .fetch_all(pool)
        .await
        .map_err(|e| corrupt(e.to_string()))?
    {
        let key: String = row.try_get("key").map_err(|e| corrupt(e.to_string()))?;
        let value: String = row.try_get("value").map_err(|e| corrupt(e.to_string()))?;
        manifest.insert(key, value);
    }

    let field = |key: &str| {
        manifest
            .get(key)
            .cloned()
            .ok_or_else(|| corrupt(format!("manifest is missing '{}'", key)))
    };
    let model = field("model")?;
    let dims: usize = field("dims")?
        .parse()
        .map_err(|_| corrupt("manifest 'dims' is not a number".to_string()))?;
    let document_count: usize = field("document_count")?
        .parse()
        .map_err(|_| corrupt("manifest 'document_count' is not a number".to_string()))?;

    let rows = sqlx::query(
        "SELECT position, content, metadata_json, vector FROM entries ORDER BY position",
    )
    .fetch_all(pool)
    .await
    .map_err(|e| corrupt(e.to_string()))?;

    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        let position: i64 = row.try_get("position").map_err(|e| corrupt(e.to_string()))?;
        let content: String = row.try_get("content").map_err(|e| corrupt(e.to_string()))?;
        let metadata_json: String = row
            .try_get("metadata_json")
            .map_err(|e| corrupt(e.to_string()))?;
        let blob: Vec<u8> = row.try_get("vector").map_err(|e| corrupt(e.to_string()))?;

        let metadata: Metadata = serde_json::from_str(&metadata_json)
            .map_err(|e| corrupt(format!("entry {}: bad metadata: {}", position, e)))?;
        let vector = blob_to_vec(&blob)
            .ok_or_else(|| corrupt(format!("entry {}: vector blob is truncated", position)))?;
        if vector.len() != dims {
            return Err(corrupt(format!(
                "entry {}: vector has {} dims, manifest says {}",
                position,
                vector.len(),
                dims
            )));
        }

        entries.push(IndexEntry {
            vector,
            document: Document::new(content, metadata),
        });
    }

    if entries.len() != document_count {
        return Err(corrupt(format!(
            "manifest lists {} documents but {} entries are stored",
            document_count,
            entries.len()
        )));
    }

    tracing::debug!(dir = %dir.display(), documents = entries.len(), %model, "loaded index");
    Ok(CorpusIndex::from_parts(model, dims, entries))
}

/// Warn when `index` was built by a different model than `embedder`.
pub fn warn_on_model_mismatch(index: &CorpusIndex, embedder: &dyn Embedder) {
    if index.model_name() != embedder.model_name() || index.dims() != embedder.dims() {
        tracing::warn!(
            index_model = index.model_name(),
            index_dims = index.dims(),
            embedder_model = embedder.model_name(),
            embedder_dims = embedder.dims(),
            "index was built with a different embedding model; similarity scores will be unreliable"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn doc(source: &str, content: &str) -> Document {
        let mut metadata = Metadata::new();
        metadata.insert("source".into(), json!(source));
        metadata.insert("path".into(), json!("/tasks/"));
        Document::new(content, metadata)
    }

    fn sample_index() -> CorpusIndex {
        CorpusIndex::from_parts(
            "hash",
            2,
            vec![
                IndexEntry {
                    vector: vec![1.0, 0.0],
                    document: doc("spec", "API Path: /tasks/"),
                },
                IndexEntry {
                    vector: vec![0.6, 0.8],
                    document: doc("execution", "Test Name: test_create"),
                },
            ],
        )
    }

    #[tokio::test]
    async fn test_persist_then_load_preserves_search() {
        let dir = TempDir::new().unwrap();
        let index = sample_index();
        persist(&index, dir.path()).await.unwrap();

        let loaded = load(dir.path()).await.unwrap();
        assert_eq!(loaded.model_name(), "hash");
        assert_eq!(loaded.dims(), 2);
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.search(&[0.0, 1.0], 2), index.search(&[0.0, 1.0], 2));
        assert_eq!(
            loaded.entries()[1].document.metadata_str("source"),
            Some("execution")
        );
        assert!(!dir.path().join("index.sqlite.tmp").exists());
    }

    #[tokio::test]
    async fn test_persist_replaces_previous_index() {
        let dir = TempDir::new().unwrap();
        persist(&sample_index(), dir.path()).await.unwrap();
        persist(&CorpusIndex::from_parts("hash", 2, Vec::new()), dir.path())
            .await
            .unwrap();

        let loaded = load(dir.path()).await.unwrap();
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn test_load_missing_index() {
        let dir = TempDir::new().unwrap();
        let err = load(&dir.path().join("nothing")).await.unwrap_err();
        assert!(matches!(err, Error::IndexNotFound { .. }));
    }

    #[tokio::test]
    async fn test_load_garbage_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(INDEX_FILE), b"definitely not sqlite").unwrap();
        let err = load(dir.path()).await.unwrap_err();
        assert!(matches!(err, Error::IndexCorrupt { .. }));
    }

    #[tokio::test]
    async fn test_load_count_mismatch_is_corrupt() {
        let dir = TempDir::new().unwrap();
        persist(&sample_index(), dir.path()).await.unwrap();

        let pool = db::connect(&index_file(dir.path()), true).await.unwrap();
        sqlx::query("DELETE FROM entries WHERE position = 1")
            .execute(&pool)
            .await
            .unwrap();
        pool.close().await;

        let err = load(dir.path()).await.unwrap_err();
        match err {
            Error::IndexCorrupt { reason, .. } => assert!(reason.contains("2 documents")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
