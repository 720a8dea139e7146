//! Route definitions for callback requests.
//!
//! The public submission endpoint is mounted at `/api/callback`; the admin
//! endpoints at `/api/callbacks`.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use callbackdesk_core::attachment::MAX_ATTACHMENT_BYTES;

use crate::handlers::callbacks;
use crate::state::AppState;

/// Request body cap for form submissions: the attachment limit plus room for
/// the text fields and multipart framing.
pub const MAX_SUBMISSION_BYTES: usize = MAX_ATTACHMENT_BYTES as usize + 1024 * 1024;

/// Public submission route.
///
/// ```text
/// POST   /callback            -> submit_callback (multipart)
/// ```
pub fn submit_router() -> Router<AppState> {
    Router::new().route(
        "/callback",
        post(callbacks::submit_callback).layer(DefaultBodyLimit::max(MAX_SUBMISSION_BYTES)),
    )
}

/// Admin routes.
///
/// ```text
/// GET    /                    -> list_callbacks
/// POST   /reload              -> reload_callbacks
/// GET    /export/csv          -> export_csv
/// GET    /{id}                -> get_callback
/// PUT    /{id}                -> update_callback
/// DELETE /{id}                -> delete_callback
/// ```
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(callbacks::list_callbacks))
        .route("/reload", post(callbacks::reload_callbacks))
        .route("/export/csv", get(callbacks::export_csv))
        .route(
            "/{id}",
            get(callbacks::get_callback)
                .put(callbacks::update_callback)
                .delete(callbacks::delete_callback),
        )
}
