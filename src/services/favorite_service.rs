use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set, SqlErr,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::favorites::{FavoriteProductList, FavoriteStatus},
    entity::{
        favorites::{ActiveModel as FavoriteActive, Column as FavCol, Entity as Favorites},
        products::{self, Column as ProdCol, Entity as Products},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::product_service::product_from_entity,
    state::AppState,
};

/// Favorites belong to a provisioned account; a session without one is rejected.
async fn ensure_account(state: &AppState, user: &AuthUser) -> AppResult<()> {
    match Users::find_by_id(user.user_id).one(&state.orm).await? {
        Some(_) => Ok(()),
        None => {
            tracing::warn!(user_id = %user.user_id, "session refers to a missing account");
            Err(AppError::Unauthorized)
        }
    }
}

fn membership(user: &AuthUser, product_id: Uuid) -> Condition {
    Condition::all()
        .add(FavCol::UserId.eq(user.user_id))
        .add(FavCol::ProductId.eq(product_id))
}

pub async fn list_favorites(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<FavoriteProductList>> {
    ensure_account(state, user).await?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Products::find()
        .join(JoinType::InnerJoin, products::Relation::Favorites.def())
        .filter(FavCol::UserId.eq(user.user_id))
        .filter(ProdCol::IsPublished.eq(true))
        .order_by_desc(FavCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "OK",
        FavoriteProductList { items },
        Some(meta),
    ))
}

pub async fn check_favorite(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<FavoriteStatus>> {
    ensure_account(state, user).await?;
    let count = Favorites::find()
        .filter(membership(user, product_id))
        .count(&state.orm)
        .await?;
    Ok(ApiResponse::success(
        "OK",
        FavoriteStatus {
            product_id,
            is_favorite: count > 0,
        },
        None,
    ))
}

/// Set-insert: adding an existing favorite changes nothing.
pub async fn add_favorite(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<FavoriteStatus>> {
    ensure_account(state, user).await?;

    if Products::find_by_id(product_id).one(&state.orm).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let existing = Favorites::find()
        .filter(membership(user, product_id))
        .one(&state.orm)
        .await?;

    if existing.is_none() {
        let inserted = FavoriteActive {
            id: Set(Uuid::new_v4()),
            user_id: Set(user.user_id),
            product_id: Set(product_id),
            created_at: Set(Utc::now().into()),
        }
        .insert(&state.orm)
        .await;

        match inserted {
            Ok(_) => {
                audit::record(
                    &state.orm,
                    Some(user.user_id),
                    "favorite_add",
                    "favorites",
                    serde_json::json!({ "product_id": product_id }),
                )
                .await;
            }
            // lost a race with an identical insert; the set already holds it
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {}
            Err(err) => return Err(err.into()),
        }
    }

    Ok(ApiResponse::success(
        "Added to favorites",
        FavoriteStatus {
            product_id,
            is_favorite: true,
        },
        Some(Meta::empty()),
    ))
}

/// Set-delete: removing an absent favorite is a no-op.
pub async fn remove_favorite(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<FavoriteStatus>> {
    ensure_account(state, user).await?;

    let result = Favorites::delete_many()
        .filter(membership(user, product_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected > 0 {
        audit::record(
            &state.orm,
            Some(user.user_id),
            "favorite_remove",
            "favorites",
            serde_json::json!({ "product_id": product_id }),
        )
        .await;
    }

    Ok(ApiResponse::success(
        "Removed from favorites",
        FavoriteStatus {
            product_id,
            is_favorite: false,
        },
        Some(Meta::empty()),
    ))
}
