//! Persistence for the callback desk: record store backends and the
//! attachment file store.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use callbackdesk_core::error::CoreError;
use callbackdesk_core::records::Records;

pub mod attachments;
pub mod json_store;
pub mod sqlite_store;

pub use attachments::AttachmentStore;
pub use json_store::JsonFileRecords;
pub use sqlite_store::SqliteRecords;

pub type DbPool = sqlx::SqlitePool;

/// File name of the JSON record document inside the data directory.
pub const JSON_DOCUMENT: &str = "callbacks.json";
/// File name of the SQLite database inside the data directory.
pub const SQLITE_DATABASE: &str = "callbacks.db";
/// Attachment directory inside the data directory.
pub const UPLOADS_DIR: &str = "uploads";

/// Which record store backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Json,
    Sqlite,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(format!(
                "Unknown store backend '{other}'. Must be one of: json, sqlite"
            )),
        }
    }
}

/// Create a connection pool from a SQLite database URL, creating the file if
/// it does not exist.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

/// Create a single-connection in-memory pool. The connection is never
/// recycled, since each new in-memory connection starts with an empty
/// database.
pub async fn create_memory_pool() -> Result<DbPool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
}

/// Apply the embedded schema migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Open the configured record store inside `data_dir`.
pub async fn open_records(
    backend: StoreBackend,
    data_dir: &Path,
) -> Result<Arc<dyn Records>, CoreError> {
    match backend {
        StoreBackend::Json => {
            let store = JsonFileRecords::open(data_dir.join(JSON_DOCUMENT)).await?;
            Ok(Arc::new(store))
        }
        StoreBackend::Sqlite => {
            tokio::fs::create_dir_all(data_dir).await?;
            let url = format!("sqlite://{}", data_dir.join(SQLITE_DATABASE).display());
            let pool = create_pool(&url)
                .await
                .map_err(|e| CoreError::Persistence(e.to_string()))?;
            run_migrations(&pool)
                .await
                .map_err(|e| CoreError::Persistence(e.to_string()))?;
            tracing::info!(%url, "SQLite record store ready");
            Ok(Arc::new(SqliteRecords::new(pool)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_parses_case_insensitively() {
        assert_eq!("JSON".parse::<StoreBackend>().unwrap(), StoreBackend::Json);
        assert_eq!(" sqlite ".parse::<StoreBackend>().unwrap(), StoreBackend::Sqlite);
        assert!("postgres".parse::<StoreBackend>().is_err());
    }

    #[tokio::test]
    async fn open_records_creates_backing_files() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("nested");

        let json = open_records(StoreBackend::Json, &data_dir).await.unwrap();
        assert_eq!(json.count().await.unwrap(), 0);
        assert!(data_dir.join(JSON_DOCUMENT).exists());

        let sqlite = open_records(StoreBackend::Sqlite, &data_dir).await.unwrap();
        assert_eq!(sqlite.count().await.unwrap(), 0);
        assert!(data_dir.join(SQLITE_DATABASE).exists());
    }
}
