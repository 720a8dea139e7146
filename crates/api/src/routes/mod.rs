pub mod calculate;
pub mod callbacks;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /callback                       public form submission (multipart)
/// /callbacks                      admin list, get, update, delete, reload
/// /callbacks/export/csv           admin CSV export
/// /calculate                      public price estimate
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(callbacks::submit_router())
        .nest("/callbacks", callbacks::admin_router())
        .merge(calculate::router())
}
