use std::sync::Arc;

use callbackdesk_core::records::Records;
use callbackdesk_db::AttachmentStore;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// The record store (JSON document or SQLite, per configuration).
    pub records: Arc<dyn Records>,
    /// Uploaded attachment files.
    pub attachments: Arc<AttachmentStore>,
}
