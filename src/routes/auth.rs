use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    routing::{get, post},
};

use crate::{
    dto::auth::{LoginRequest, LoginResponse, RegisterRequest, SessionUser},
    error::{AppError, AppResult},
    middleware::{
        auth::{AuthUser, clear_session_cookie, session_cookie},
        json::ApiJson,
    },
    models::User,
    response::{ApiResponse, Meta},
    services::auth_service::{login_user, register_user},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/session", get(session))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Register user", body = ApiResponse<User>),
        (status = 400, description = "Validation failed or email taken"),
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<User>>)> {
    let resp = register_user(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued; also set as an HttpOnly cookie", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<(HeaderMap, Json<ApiResponse<LoginResponse>>)> {
    let resp = login_user(&state, payload).await?;
    let token = resp
        .data
        .as_ref()
        .map(|data| data.token.as_str())
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("login produced no token")))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        cookie_header(&session_cookie(token, state.sessions.ttl_seconds()))?,
    );
    Ok((headers, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Session cookie cleared"),
    ),
    tag = "Auth"
)]
pub async fn logout() -> AppResult<(HeaderMap, Json<ApiResponse<serde_json::Value>>)> {
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, cookie_header(&clear_session_cookie())?);
    Ok((
        headers,
        Json(ApiResponse::success(
            "Logged out",
            serde_json::json!({}),
            Some(Meta::empty()),
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses(
        (status = 200, description = "Current session", body = ApiResponse<SessionUser>),
        (status = 401, description = "No valid session"),
    ),
    security(("bearer_auth" = []), ("session_cookie" = [])),
    tag = "Auth"
)]
pub async fn session(user: AuthUser) -> Json<ApiResponse<SessionUser>> {
    let data = SessionUser {
        id: user.user_id,
        email: user.email,
        name: user.name,
        role: user.role,
    };
    Json(ApiResponse::success("Session", data, Some(Meta::empty())))
}

fn cookie_header(value: &str) -> AppResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| AppError::Internal(anyhow::anyhow!(e)))
}
