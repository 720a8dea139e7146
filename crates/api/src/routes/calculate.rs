use axum::routing::post;
use axum::Router;

use crate::handlers::calculate;
use crate::state::AppState;

/// Price calculator route.
///
/// ```text
/// POST   /calculate           -> calculate_price
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/calculate", post(calculate::calculate_price))
}
