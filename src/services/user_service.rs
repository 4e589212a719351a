use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

use crate::{
    dto::users::UpdateProfileRequest,
    entity::users::{ActiveModel as UserActive, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Role, User},
    response::{ApiResponse, Meta},
    state::AppState,
    validation::Validator,
};

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let model = Users::find_by_id(user.user_id).one(&state.orm).await?;
    let model = match model {
        Some(m) => m,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Profile", user_from_entity(model), None))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    let mut v = Validator::new();
    if let Some(name) = &payload.name {
        v.required("name", name);
    }
    v.finish()?;

    let existing = Users::find_by_id(user.user_id).one(&state.orm).await?;
    let existing = match existing {
        Some(m) => m,
        None => return Err(AppError::NotFound),
    };

    let mut active: UserActive = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(blank_to_none(phone));
    }
    if let Some(address) = payload.address {
        active.address = Set(blank_to_none(address));
    }
    let updated = active.update(&state.orm).await?;

    tracing::debug!(user_id = %updated.id, "profile updated");
    Ok(ApiResponse::success(
        "Profile updated",
        user_from_entity(updated),
        Some(Meta::empty()),
    ))
}

fn blank_to_none(value: String) -> Option<String> {
    let value = value.trim().to_string();
    (!value.is_empty()).then_some(value)
}

pub fn user_from_entity(model: UserModel) -> User {
    let role = model.role.parse::<Role>().unwrap_or(Role::User);
    User {
        id: model.id,
        name: model.name,
        email: model.email,
        role,
        phone: model.phone,
        address: model.address,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
