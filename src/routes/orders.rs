use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    dto::orders::{CreateOrderRequest, OrderList, OrderWithItems},
    error::AppResult,
    middleware::{auth::AuthUser, json::ApiJson},
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    services::order_service::{self, OrderOutcome},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_my_orders))
        .route("/create", post(create_order))
        .route("/{payment_reference}", get(get_order))
}

#[utoipa::path(
    post,
    path = "/api/orders/create",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order recorded after payment verification", body = ApiResponse<OrderWithItems>),
        (status = 200, description = "Order already recorded for this payment reference", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Validation, catalog or payment verification failed"),
        (status = 500, description = "Payment provider or database unavailable"),
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    ApiJson(payload): ApiJson<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderWithItems>>)> {
    let outcome = order_service::create_order(&state, viewer.as_ref(), payload).await?;
    let (status, message) = match &outcome {
        OrderOutcome::Created(_) => (StatusCode::CREATED, "Order created"),
        OrderOutcome::Existing(_) => (StatusCode::OK, "Order already exists"),
    };
    Ok((
        status,
        Json(ApiResponse::success(
            message,
            outcome.into_inner(),
            Some(Meta::empty()),
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Orders placed by the caller", body = ApiResponse<OrderList>),
        (status = 401, description = "No valid session"),
    ),
    security(("bearer_auth" = []), ("session_cookie" = [])),
    tag = "Orders"
)]
pub async fn list_my_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_my_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{payment_reference}",
    params(
        ("payment_reference" = String, Path, description = "Payment provider reference")
    ),
    responses(
        (status = 200, description = "Order with items", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "No order for this reference"),
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(payment_reference): Path<String>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::get_order_by_reference(&state, &payment_reference).await?;
    Ok(Json(resp))
}
