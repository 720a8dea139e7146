//! Handler for the public price calculator.

use axum::extract::rejection::JsonRejection;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use callbackdesk_core::estimation::{estimate_request, EstimateRequest};

use crate::error::{AppError, AppResult};

/// Calculator response: `{ "success": true, "price": ..., "currency": "RUB" }`.
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub success: bool,
    pub price: u64,
    pub currency: &'static str,
}

/// POST /api/calculate
///
/// Quote a price from `weight` (tonnes), `complexity`, and `coating`.
pub async fn calculate_price(
    payload: Result<Json<EstimateRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let quote = estimate_request(&request)?;

    tracing::debug!(
        weight = ?request.weight,
        complexity = ?request.complexity,
        coating = ?request.coating,
        price = quote.price,
        "Price estimated"
    );

    Ok(Json(QuoteResponse {
        success: true,
        price: quote.price,
        currency: quote.currency,
    }))
}
