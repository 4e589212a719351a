use axum::{Router, middleware::from_fn_with_state, routing::get};

use crate::{error::AppError, middleware::auth::require_admin, state::AppState};

pub mod admin;
pub mod auth;
pub mod cart;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod products;
pub mod users;

/// API routes under `/api`; state is bound by the caller.
pub fn create_api_router(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/products", products::router())
        .nest("/auth", auth::router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::router())
        .nest("/users", users::router())
        .nest(
            "/admin",
            admin::router().route_layer(from_fn_with_state(state, require_admin)),
        )
}

pub fn health_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness))
}

/// Full application router with state bound; transport layers are added by the binary.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(health_router())
        .nest("/api", create_api_router(state.clone()))
        .merge(doc::scalar_docs())
        .fallback(not_found)
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::NotFound
}
