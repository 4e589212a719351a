use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::dto::products::{CreateProductRequest, ProductPage, UpdateProductRequest};
use crate::{
    audit,
    entity::products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Dimensions, Product},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSort, SortOrder, contains_pattern},
    state::AppState,
    validation::Validator,
};

pub const MAX_KEY_FEATURES: usize = 4;

/// Customers only ever see published products; admins see everything.
pub async fn list_products(
    state: &AppState,
    viewer: Option<&AuthUser>,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductPage>> {
    let (page, limit, offset) = query.pagination().normalize();
    let condition = listing_condition(&query, viewer.is_some_and(AuthUser::is_admin));

    let (sort, direction) = ProductSort::resolve(query.sort.as_deref(), query.order.as_deref());
    let sort_col = match sort {
        ProductSort::Price => Column::Price,
        ProductSort::Name => Column::Name,
        ProductSort::Stock => Column::Stock,
        ProductSort::Rating => Column::Rating,
        ProductSort::Popularity => Column::SalesCount,
        ProductSort::Newest => Column::CreatedAt,
        ProductSort::Updated => Column::UpdatedAt,
    };

    let mut finder = Products::find().filter(condition);
    finder = match direction {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };
    // stable paging when the sort column ties
    finder = finder.order_by_asc(Column::Id);

    let total = finder.clone().count(&state.orm).await? as i64;

    let products = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    let data = ProductPage {
        products,
        pagination: meta.clone(),
    };
    Ok(ApiResponse::success("Products", data, Some(meta)))
}

fn listing_condition(query: &ProductQuery, include_unpublished: bool) -> Condition {
    let mut condition = Condition::all();

    if !include_unpublished {
        condition = condition.add(Column::IsPublished.eq(true));
    }
    if let Some(category) = non_empty(&query.category) {
        condition = condition.add(Column::Category.eq(category));
    }
    if let Some(subcategory) = non_empty(&query.subcategory) {
        condition = condition.add(Column::Subcategory.eq(subcategory));
    }
    if let Some(featured) = query.featured {
        condition = condition.add(Column::IsFeatured.eq(featured));
    }
    match query.in_stock {
        Some(true) => condition = condition.add(Column::Stock.gt(0)),
        Some(false) => condition = condition.add(Column::Stock.eq(0)),
        None => {}
    }
    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }
    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }
    if let Some(search) = non_empty(&query.search) {
        let pattern = contains_pattern(&search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern.clone()))
                .add(Expr::col(Column::Category).ilike(pattern)),
        );
    }

    condition
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub async fn get_product(
    state: &AppState,
    viewer: Option<&AuthUser>,
    id: Uuid,
) -> AppResult<ApiResponse<Product>> {
    let product = Products::find_by_id(id).one(&state.orm).await?;
    let product = match product {
        Some(p) if p.is_published || viewer.is_some_and(AuthUser::is_admin) => p,
        _ => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success(
        "Product",
        product_from_entity(product),
        None,
    ))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let images = payload.all_images();
    let key_features = clean_features(&payload.key_features);

    let mut v = Validator::new();
    v.required("name", &payload.name)
        .required("description", &payload.description)
        .check(payload.price > 0, "price", "must be greater than 0")
        .required("category", &payload.category)
        .check(!images.is_empty(), "image", "at least one image is required")
        .check(payload.stock >= 0, "stock", "cannot be negative");
    check_key_features(&mut v, &payload.key_features, &key_features);
    if !v.has_error("name") && name_taken(&state.orm, payload.name.trim(), None).await? {
        v.push("name", "a product with this name already exists");
    }
    v.finish()?;

    let now = Utc::now();
    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description.trim().to_string()),
        price: Set(payload.price),
        images: Set(serde_json::json!(images)),
        category: Set(payload.category.trim().to_lowercase()),
        subcategory: Set(payload
            .subcategory
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())),
        key_features: Set(serde_json::json!(key_features)),
        stock: Set(payload.stock),
        is_published: Set(payload.is_published.unwrap_or(true)),
        is_featured: Set(payload.is_featured.unwrap_or(false)),
        weight: Set(payload.weight),
        dimensions: Set(payload.dimensions.map(|d| serde_json::json!(d))),
        rating: Set(0.0),
        sales_count: Set(0),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };
    let product = active.insert(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let mut v = Validator::new();
    if let Some(name) = &payload.name {
        v.required("name", name);
        if !name.trim().is_empty() && name_taken(&state.orm, name.trim(), Some(id)).await? {
            v.push("name", "a product with this name already exists");
        }
    }
    if let Some(description) = &payload.description {
        v.required("description", description);
    }
    if let Some(category) = &payload.category {
        v.required("category", category);
    }
    if let Some(price) = payload.price {
        v.check(price > 0, "price", "must be greater than 0");
    }
    if let Some(stock) = payload.stock {
        v.check(stock >= 0, "stock", "cannot be negative");
    }
    if let Some(images) = &payload.images {
        v.check(
            images.iter().any(|url| !url.trim().is_empty()),
            "image",
            "at least one image is required",
        );
    }
    if let Some(features) = &payload.key_features {
        check_key_features(&mut v, features, &clean_features(features));
    }
    v.finish()?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description.trim().to_string());
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(category) = payload.category {
        active.category = Set(category.trim().to_lowercase());
    }
    if let Some(subcategory) = payload.subcategory {
        let subcategory = subcategory.trim().to_lowercase();
        active.subcategory = Set((!subcategory.is_empty()).then_some(subcategory));
    }
    if let Some(images) = payload.images {
        let images: Vec<String> = images
            .into_iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect();
        active.images = Set(serde_json::json!(images));
    }
    if let Some(features) = payload.key_features {
        active.key_features = Set(serde_json::json!(clean_features(&features)));
    }
    if let Some(stock) = payload.stock {
        active.stock = Set(stock);
    }
    if let Some(is_published) = payload.is_published {
        active.is_published = Set(is_published);
    }
    if let Some(is_featured) = payload.is_featured {
        active.is_featured = Set(is_featured);
    }
    if let Some(weight) = payload.weight {
        active.weight = Set(Some(weight));
    }
    if let Some(dimensions) = payload.dimensions {
        active.dimensions = Set(Some(serde_json::json!(dimensions)));
    }
    active.updated_at = Set(Utc::now().into());

    let product = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Products::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.orm,
        Some(user.user_id),
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Fetch the current catalog rows for a set of ids.
pub async fn find_by_ids<C: ConnectionTrait>(
    conn: &C,
    ids: &[Uuid],
) -> AppResult<HashMap<Uuid, Product>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = Products::find()
        .filter(Column::Id.is_in(ids.iter().copied()))
        .all(conn)
        .await?;
    Ok(rows
        .into_iter()
        .map(|row| (row.id, product_from_entity(row)))
        .collect())
}

async fn name_taken<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    except: Option<Uuid>,
) -> AppResult<bool> {
    let mut condition = Condition::all().add(Column::Name.eq(name));
    if let Some(id) = except {
        condition = condition.add(Column::Id.ne(id));
    }
    Ok(Products::find().filter(condition).count(conn).await? > 0)
}

fn clean_features(features: &[String]) -> Vec<String> {
    features
        .iter()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect()
}

fn check_key_features(v: &mut Validator, raw: &[String], cleaned: &[String]) {
    v.check(
        !cleaned.is_empty() && raw.len() <= MAX_KEY_FEATURES && cleaned.len() == raw.len(),
        "keyFeatures",
        "between 1 and 4 non-empty key features are required",
    );
}

pub fn product_from_entity(model: ProductModel) -> Product {
    let images: Vec<String> = serde_json::from_value(model.images).unwrap_or_default();
    let key_features: Vec<String> = serde_json::from_value(model.key_features).unwrap_or_default();
    let dimensions: Option<Dimensions> = model
        .dimensions
        .and_then(|value| serde_json::from_value(value).ok());

    Product {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        images,
        category: model.category,
        subcategory: model.subcategory,
        key_features,
        in_stock: model.stock > 0,
        stock: model.stock,
        is_published: model.is_published,
        is_featured: model.is_featured,
        weight: model.weight,
        dimensions,
        rating: model.rating,
        sales_count: model.sales_count,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(stock: i32) -> ProductModel {
        let now = Utc::now();
        ProductModel {
            id: Uuid::new_v4(),
            name: "Heirloom Tomato".into(),
            description: "Open-pollinated".into(),
            price: 450,
            images: serde_json::json!(["https://cdn.example.com/tomato.jpg"]),
            category: "seeds".into(),
            subcategory: Some("vegetables".into()),
            key_features: serde_json::json!(["Organic", "Non-GMO"]),
            stock,
            is_published: true,
            is_featured: false,
            weight: Some(0.05),
            dimensions: Some(serde_json::json!({ "length": 10.0, "width": 7.0, "height": 0.5 })),
            rating: 4.5,
            sales_count: 12,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[test]
    fn in_stock_is_derived_from_stock() {
        assert!(product_from_entity(model(3)).in_stock);
        assert!(!product_from_entity(model(0)).in_stock);
    }

    #[test]
    fn json_columns_are_decoded() {
        let product = product_from_entity(model(1));
        assert_eq!(product.images.len(), 1);
        assert_eq!(product.key_features, vec!["Organic", "Non-GMO"]);
        assert_eq!(product.dimensions.as_ref().map(|d| d.width), Some(7.0));
        assert_eq!(product.primary_image(), "https://cdn.example.com/tomato.jpg");
    }

    #[test]
    fn key_features_must_be_one_to_four() {
        let check = |raw: Vec<&str>| {
            let raw: Vec<String> = raw.into_iter().map(String::from).collect();
            let mut v = Validator::new();
            check_key_features(&mut v, &raw, &clean_features(&raw));
            v.finish().is_ok()
        };
        assert!(!check(vec![]));
        assert!(check(vec!["a"]));
        assert!(check(vec!["a", "b", "c", "d"]));
        assert!(!check(vec!["a", "b", "c", "d", "e"]));
        assert!(!check(vec!["a", " "]));
    }
}
