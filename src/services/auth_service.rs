use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::Utc;
use password_hash::rand_core::OsRng;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::auth::{LoginRequest, LoginResponse, RegisterRequest, SessionUser},
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    error::{AppError, AppResult},
    models::{Role, User},
    response::{ApiResponse, Meta},
    services::user_service::user_from_entity,
    state::AppState,
    validation::{Validator, normalize_email},
};

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

/// Returns `Ok(false)` on mismatch; only an unparseable stored hash is an error.
pub fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(stored_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Explicit account provisioning; the only place user rows are created at runtime.
pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let RegisterRequest {
        name,
        email,
        password,
    } = payload;
    let email = normalize_email(&email);

    let mut v = Validator::new();
    v.required("name", &name).email("email", &email).check(
        password.chars().count() >= MIN_PASSWORD_LEN,
        "password",
        "must be at least 8 characters",
    );
    if !v.has_error("email")
        && Users::find()
            .filter(UserCol::Email.eq(email.as_str()))
            .one(&state.orm)
            .await?
            .is_some()
    {
        v.push("email", "is already taken");
    }
    v.finish()?;

    let password_hash = hash_password(&password)?;

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.trim().to_string()),
        email: Set(email),
        password_hash: Set(Some(password_hash)),
        role: Set(Role::User.as_str().to_string()),
        phone: Set(None),
        address: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        Some(user.id),
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success("User created", user_from_entity(user), None))
}

/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let user = Users::find()
        .filter(UserCol::Email.eq(normalize_email(&email)))
        .one(&state.orm)
        .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::InvalidCredentials),
    };
    let Some(stored_hash) = user.password_hash.as_deref() else {
        return Err(AppError::InvalidCredentials);
    };
    if !verify_password(&password, stored_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let role = user.role.parse::<Role>().map_err(|e| {
        AppError::Internal(anyhow::anyhow!("user {} has invalid role: {e}", user.id))
    })?;
    let session = SessionUser {
        id: user.id,
        email: user.email.clone(),
        name: user.name.clone(),
        role,
    };
    let token = state.sessions.issue(&session)?;

    audit::record(
        &state.orm,
        Some(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token,
            user: session,
        },
        Some(Meta::empty()),
    ))
}
