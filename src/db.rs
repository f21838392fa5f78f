use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;

/// Open a single-connection pool on the SQLite file at `path`.
///
/// `writable` creates the file if missing; otherwise the file is opened
/// read-only and must already exist.
pub async fn connect(path: &Path, writable: bool) -> sqlx::Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(writable)
        .read_only(!writable)
        .journal_mode(SqliteJournalMode::Delete);

    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
}
