use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::{
        favorites::{FavoriteCheckQuery, FavoriteProductList, FavoriteRequest, FavoriteStatus},
        users::UpdateProfileRequest,
    },
    error::AppResult,
    middleware::{auth::AuthUser, json::ApiJson},
    models::User,
    response::ApiResponse,
    routes::params::Pagination,
    services::{favorite_service, user_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me).patch(update_me))
        .route(
            "/favorites",
            get(list_favorites)
                .post(add_favorite)
                .delete(remove_favorite),
        )
        .route("/favorites/check", get(check_favorite))
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Caller's profile", body = ApiResponse<User>),
        (status = 401, description = "No valid session"),
        (status = 404, description = "Account no longer exists"),
    ),
    security(("bearer_auth" = []), ("session_cookie" = [])),
    tag = "Users"
)]
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = user_service::get_profile(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/users/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = ApiResponse<User>),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "No valid session"),
    ),
    security(("bearer_auth" = []), ("session_cookie" = [])),
    tag = "Users"
)]
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = user_service::update_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/users/favorites",
    params(Pagination),
    responses(
        (status = 200, description = "Favorited products", body = ApiResponse<FavoriteProductList>),
        (status = 401, description = "No valid session"),
    ),
    security(("bearer_auth" = []), ("session_cookie" = [])),
    tag = "Favorites"
)]
pub async fn list_favorites(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<FavoriteProductList>>> {
    let resp = favorite_service::list_favorites(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/users/favorites/check",
    params(FavoriteCheckQuery),
    responses(
        (status = 200, description = "Membership of the product in the caller's favorites", body = ApiResponse<FavoriteStatus>),
        (status = 401, description = "No valid session"),
    ),
    security(("bearer_auth" = []), ("session_cookie" = [])),
    tag = "Favorites"
)]
pub async fn check_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<FavoriteCheckQuery>,
) -> AppResult<Json<ApiResponse<FavoriteStatus>>> {
    let resp = favorite_service::check_favorite(&state, &user, query.product_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/users/favorites",
    request_body = FavoriteRequest,
    responses(
        (status = 200, description = "Product is in favorites", body = ApiResponse<FavoriteStatus>),
        (status = 401, description = "No valid session"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = []), ("session_cookie" = [])),
    tag = "Favorites"
)]
pub async fn add_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<FavoriteRequest>,
) -> AppResult<Json<ApiResponse<FavoriteStatus>>> {
    let resp = favorite_service::add_favorite(&state, &user, payload.product_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/users/favorites",
    request_body = FavoriteRequest,
    responses(
        (status = 200, description = "Product is not in favorites", body = ApiResponse<FavoriteStatus>),
        (status = 401, description = "No valid session"),
    ),
    security(("bearer_auth" = []), ("session_cookie" = [])),
    tag = "Favorites"
)]
pub async fn remove_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<FavoriteRequest>,
) -> AppResult<Json<ApiResponse<FavoriteStatus>>> {
    let resp = favorite_service::remove_favorite(&state, &user, payload.product_id).await?;
    Ok(Json(resp))
}
