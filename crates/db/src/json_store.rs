//! Flat JSON document record store.
//!
//! The whole collection lives in one pretty-printed JSON array. The store
//! keeps the authoritative in-memory copy behind an async `RwLock`; every
//! mutation builds the next collection, writes it out (temp file + rename),
//! and only then replaces the cached copy, so a failed write leaves both the
//! file and the cache at the previous state.
//!
//! Mutations are serialized within this process. Another process writing the
//! same document is not coordinated with: the later whole-document write wins.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::RwLock;

use callbackdesk_core::callback::{sort_newest_first, CallbackPatch, CallbackRequest};
use callbackdesk_core::error::CoreError;
use callbackdesk_core::records::{not_found, Records};

/// Record store backed by a single JSON document.
#[derive(Debug)]
pub struct JsonFileRecords {
    path: PathBuf,
    cache: RwLock<Vec<CallbackRequest>>,
}

impl JsonFileRecords {
    /// Open the document at `path`, creating it (and its parent directory) as
    /// an empty array if it does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| io_error(parent, e))?;
        }

        let exists = fs::try_exists(&path).await.map_err(|e| io_error(&path, e))?;
        if !exists {
            write_document(&path, &[]).await?;
            tracing::info!(path = %path.display(), "Created empty callback document");
        }

        let records = read_document(&path).await?;
        tracing::debug!(path = %path.display(), count = records.len(), "Loaded callback document");

        Ok(Self {
            path,
            cache: RwLock::new(records),
        })
    }

    /// Location of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Records for JsonFileRecords {
    async fn append(&self, record: CallbackRequest) -> Result<CallbackRequest, CoreError> {
        let mut cache = self.cache.write().await;
        if cache.iter().any(|r| r.id == record.id) {
            return Err(CoreError::Validation(format!(
                "A callback request with id {} already exists",
                record.id
            )));
        }

        let mut next = cache.clone();
        next.push(record.clone());
        write_document(&self.path, &next).await?;
        *cache = next;

        Ok(record)
    }

    async fn list_all(&self) -> Result<Vec<CallbackRequest>, CoreError> {
        let mut records = self.cache.read().await.clone();
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn find(&self, id: &str) -> Result<Option<CallbackRequest>, CoreError> {
        Ok(self.cache.read().await.iter().find(|r| r.id == id).cloned())
    }

    async fn update(&self, id: &str, patch: &CallbackPatch) -> Result<CallbackRequest, CoreError> {
        let mut cache = self.cache.write().await;
        let index = cache
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| not_found(id))?;

        let mut next = cache.clone();
        next[index].apply_patch(patch);
        let updated = next[index].clone();
        write_document(&self.path, &next).await?;
        *cache = next;

        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<CallbackRequest, CoreError> {
        let mut cache = self.cache.write().await;
        let index = cache
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| not_found(id))?;

        let mut next = cache.clone();
        let removed = next.remove(index);
        write_document(&self.path, &next).await?;
        *cache = next;

        Ok(removed)
    }

    async fn reload(&self) -> Result<usize, CoreError> {
        let records = read_document(&self.path).await?;
        let count = records.len();
        *self.cache.write().await = records;
        tracing::info!(path = %self.path.display(), count, "Reloaded callback document");
        Ok(count)
    }

    async fn count(&self) -> Result<usize, CoreError> {
        Ok(self.cache.read().await.len())
    }
}

// ---------------------------------------------------------------------------
// Document I/O
// ---------------------------------------------------------------------------

fn io_error(path: &Path, err: std::io::Error) -> CoreError {
    CoreError::Persistence(format!("{}: {err}", path.display()))
}

/// Read and parse the document. A blank file counts as an empty collection;
/// anything else that does not parse is an error rather than silently empty.
async fn read_document(path: &Path) -> Result<Vec<CallbackRequest>, CoreError> {
    let bytes = fs::read(path).await.map_err(|e| io_error(path, e))?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    serde_json::from_slice(&bytes).map_err(|e| {
        CoreError::Persistence(format!("{} is not a valid callback document: {e}", path.display()))
    })
}

async fn write_document(path: &Path, records: &[CallbackRequest]) -> Result<(), CoreError> {
    let json = serde_json::to_vec_pretty(records)?;
    let tmp = path.with_extension("json.tmp");

    fs::write(&tmp, &json).await.map_err(|e| io_error(&tmp, e))?;
    fs::rename(&tmp, path).await.map_err(|e| io_error(path, e))?;

    tracing::debug!(path = %path.display(), count = records.len(), "Wrote callback document");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
