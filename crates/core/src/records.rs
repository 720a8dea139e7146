//! The record store capability.
//!
//! Handlers depend on [`Records`] only, so the flat JSON document and the
//! embedded SQLite database are interchangeable.

use async_trait::async_trait;

use crate::callback::{CallbackPatch, CallbackRequest};
use crate::error::CoreError;

/// Entity name used in `NotFound` errors.
pub const ENTITY: &str = "CallbackRequest";

/// Durable collection of callback requests.
#[async_trait]
pub trait Records: Send + Sync {
    /// Append a new record and persist the collection.
    async fn append(&self, record: CallbackRequest) -> Result<CallbackRequest, CoreError>;

    /// Every record, newest first.
    async fn list_all(&self) -> Result<Vec<CallbackRequest>, CoreError>;

    /// A single record by id.
    async fn find(&self, id: &str) -> Result<Option<CallbackRequest>, CoreError>;

    /// Apply `patch`, stamp `updatedAt`, persist, and return the updated record.
    /// Fails with `NotFound` if no record has this id.
    async fn update(&self, id: &str, patch: &CallbackPatch) -> Result<CallbackRequest, CoreError>;

    /// Remove a record and return it so the caller can release its attachment.
    /// Fails with `NotFound`, leaving the collection untouched, if no record has
    /// this id.
    async fn delete(&self, id: &str) -> Result<CallbackRequest, CoreError>;

    /// Re-read the durable state, discarding any cached view. Returns the
    /// number of records loaded.
    async fn reload(&self) -> Result<usize, CoreError>;

    /// Number of stored records.
    async fn count(&self) -> Result<usize, CoreError> {
        Ok(self.list_all().await?.len())
    }
}

/// Build the `NotFound` error for a record id.
pub fn not_found(id: &str) -> CoreError {
    CoreError::NotFound {
        entity: ENTITY,
        id: id.to_string(),
    }
}
