//! Handlers for callback requests.
//!
//! Provides the public multipart submission endpoint and the admin endpoints
//! for listing, inspecting, updating, deleting, reloading, and exporting
//! callback requests.

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use callbackdesk_core::attachment::{validate_upload_type, MAX_ATTACHMENT_BYTES};
use callbackdesk_core::callback::{
    validate_submission, CallbackPatch, CallbackRequest, CallbackSubmission, UpdateCallback,
};
use callbackdesk_core::error::CoreError;
use callbackdesk_core::export::{build_callbacks_csv, export_file_name};
use callbackdesk_core::records::not_found;

use crate::error::{AppError, AppResult};
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Response to a successful form submission.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: &'static str,
    pub id: String,
}

/// Payload of a reload response.
#[derive(Debug, Serialize)]
pub struct ReloadSummary {
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Multipart helpers
// ---------------------------------------------------------------------------

/// An uploaded file part, buffered in memory.
struct Upload {
    file_name: String,
    content_type: Option<String>,
    data: Vec<u8>,
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return CoreError::PayloadTooLarge {
            limit_bytes: MAX_ATTACHMENT_BYTES,
        }
        .into();
    }
    AppError::BadRequest(err.body_text())
}

/// Read a file part chunk by chunk, giving up as soon as it exceeds the
/// attachment size limit.
async fn read_limited(field: &mut Field<'_>) -> AppResult<Vec<u8>> {
    let mut data = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if (data.len() + chunk.len()) as u64 > MAX_ATTACHMENT_BYTES {
            return Err(CoreError::PayloadTooLarge {
                limit_bytes: MAX_ATTACHMENT_BYTES,
            }
            .into());
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

async fn read_text(field: Field<'_>) -> AppResult<String> {
    field.text().await.map_err(multipart_error)
}

// ---------------------------------------------------------------------------
// Public handlers
// ---------------------------------------------------------------------------

/// POST /api/callback
///
/// Accept a multipart form with `name`, `phone`, `email`, `productType`,
/// `comment`, and an optional `file` part.
pub async fn submit_callback(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut submission = CallbackSubmission::default();
    let mut upload: Option<Upload> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                // An empty file input is still sent as a part with no filename.
                if file_name.is_empty() {
                    continue;
                }
                let content_type = field.content_type().map(str::to_string);
                validate_upload_type(&file_name, content_type.as_deref())?;
                let data = read_limited(&mut field).await?;
                upload = Some(Upload {
                    file_name,
                    content_type,
                    data,
                });
            }
            "name" => submission.name = Some(read_text(field).await?),
            "phone" => submission.phone = Some(read_text(field).await?),
            "email" => submission.email = Some(read_text(field).await?),
            "productType" => submission.product_type = Some(read_text(field).await?),
            "comment" => submission.comment = Some(read_text(field).await?),
            _ => {} // ignore unknown fields
        }
    }

    let new = validate_submission(&submission)?;

    let attachment = match &upload {
        Some(u) => Some(
            state
                .attachments
                .save(&u.file_name, u.content_type.as_deref(), &u.data)
                .await?,
        ),
        None => None,
    };

    let record = CallbackRequest::create(new, attachment);
    let stored_file = record.file.clone();

    let record = match state.records.append(record).await {
        Ok(record) => record,
        Err(err) => {
            // Do not leave an orphaned upload behind.
            if let Some(file) = stored_file {
                if let Err(cleanup) = state.attachments.remove(&file).await {
                    tracing::warn!(file = %file, error = %cleanup, "Failed to remove orphaned attachment");
                }
            }
            return Err(err.into());
        }
    };

    tracing::info!(
        callback_id = %record.id,
        has_attachment = record.file.is_some(),
        "Callback request submitted"
    );

    Ok(Json(SubmitResponse {
        success: true,
        message: "Request submitted successfully",
        id: record.id,
    }))
}

// ---------------------------------------------------------------------------
// Admin handlers
// ---------------------------------------------------------------------------

/// GET /api/callbacks
///
/// List every callback request, newest first.
pub async fn list_callbacks(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let records = state.records.list_all().await?;
    Ok(Json(DataResponse::new(records)))
}

/// GET /api/callbacks/{id}
pub async fn get_callback(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let record = state
        .records
        .find(&id)
        .await?
        .ok_or_else(|| not_found(&id))?;

    Ok(Json(DataResponse::new(record)))
}

/// PUT /api/callbacks/{id}
///
/// Update status and/or note. An explicit empty `note` is stored as empty;
/// an absent `note` leaves the existing one untouched.
pub async fn update_callback(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateCallback>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let patch = CallbackPatch::try_from(input)?;

    let record = state.records.update(&id, &patch).await?;

    tracing::info!(
        callback_id = %id,
        status = %record.status,
        note_changed = patch.note.is_some(),
        "Callback request updated"
    );

    Ok(Json(DataResponse::new(record)))
}

/// DELETE /api/callbacks/{id}
///
/// Delete a callback request and, best effort, its attachment file.
pub async fn delete_callback(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let removed = state.records.delete(&id).await?;

    if let Some(file) = &removed.file {
        if let Err(err) = state.attachments.remove(file).await {
            tracing::warn!(callback_id = %id, file = %file, error = %err, "Failed to remove attachment");
        }
    }

    tracing::info!(callback_id = %id, "Callback request deleted");

    Ok(Json(MessageResponse::new("Request deleted")))
}

/// POST /api/callbacks/reload
///
/// Re-read the record store from disk.
pub async fn reload_callbacks(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let count = state.records.reload().await?;
    Ok(Json(DataResponse::new(ReloadSummary { count })))
}

/// GET /api/callbacks/export/csv
///
/// Export all callback requests as a CSV attachment.
pub async fn export_csv(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let records = state.records.list_all().await?;
    let csv = build_callbacks_csv(&records);
    let disposition = format!(
        "attachment; filename={}",
        export_file_name(&chrono::Utc::now())
    );

    tracing::info!(count = records.len(), "Callback requests exported");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}
