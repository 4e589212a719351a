use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::cart::{CartQuote, QuoteRequest},
    error::AppResult,
    middleware::json::ApiJson,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/quote", post(quote))
}

/// Re-price a client-held cart against the live catalog before checkout.
#[utoipa::path(
    post,
    path = "/api/cart/quote",
    request_body = QuoteRequest,
    responses(
        (status = 200, description = "Cart lines at current catalog prices", body = ApiResponse<CartQuote>),
        (status = 400, description = "Malformed cart"),
    ),
    tag = "Cart"
)]
pub async fn quote(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<QuoteRequest>,
) -> AppResult<Json<ApiResponse<CartQuote>>> {
    let resp = cart_service::quote_cart(&state, payload).await?;
    Ok(Json(resp))
}
