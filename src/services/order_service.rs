use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{CreateOrderRequest, OrderItemInput, OrderList, OrderWithItems},
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem, OrderStatus, Product, ShippingAddress},
    payments::is_safe_reference,
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    services::product_service,
    state::AppState,
    validation::{Validator, normalize_email},
};

/// Whether the call wrote a new order or found one already recorded for the reference.
#[derive(Debug)]
pub enum OrderOutcome {
    Created(OrderWithItems),
    Existing(OrderWithItems),
}

impl OrderOutcome {
    pub fn into_inner(self) -> OrderWithItems {
        match self {
            OrderOutcome::Created(order) | OrderOutcome::Existing(order) => order,
        }
    }
}

/// Line re-priced from the catalog; this is what gets snapshotted.
#[derive(Debug, Clone, PartialEq)]
struct PricedLine {
    product_id: Uuid,
    name: String,
    price: i64,
    quantity: i32,
    category: String,
    image: String,
}

/// Persist an order after the payment has been verified with the provider.
///
/// The payment reference is unique: a repeated submission returns the order
/// that was already recorded instead of writing a second one.
pub async fn create_order(
    state: &AppState,
    viewer: Option<&AuthUser>,
    payload: CreateOrderRequest,
) -> AppResult<OrderOutcome> {
    let shipping = validate_request(&payload)?;
    let reference = payload.payment_reference.trim().to_string();
    let email = normalize_email(&payload.email);

    if let Some(existing) = find_by_reference(&state.orm, &reference).await? {
        tracing::info!(payment_reference = %reference, "order already recorded for reference");
        return Ok(OrderOutcome::Existing(existing));
    }

    let merged = merge_lines(&payload.items);
    let ids: Vec<Uuid> = merged.iter().map(|(id, _)| *id).collect();
    let catalog = product_service::find_by_ids(&state.orm, &ids).await?;
    let (lines, server_total) = price_lines(&merged, &catalog, payload.total)?;

    let verification = state.payments.verify(&reference).await?;
    let mut v = Validator::new();
    v.check(
        verification.succeeded,
        "paymentReference",
        "payment was not successful",
    )
    .check(
        verification.amount == server_total,
        "paymentReference",
        "paid amount does not match the order total",
    );
    v.finish()?;

    let txn = state.orm.begin().await?;
    let now = Utc::now();
    let order_id = Uuid::new_v4();
    let inserted = OrderActive {
        id: Set(order_id),
        payment_reference: Set(reference.clone()),
        user_id: Set(viewer.map(|u| u.user_id)),
        email: Set(email),
        total: Set(server_total),
        status: Set(OrderStatus::Paid.as_str().to_string()),
        shipping_street: Set(shipping.street.trim().to_string()),
        shipping_city: Set(shipping.city.trim().to_string()),
        shipping_province: Set(shipping.province.trim().to_string()),
        shipping_postal_code: Set(shipping.postal_code.trim().to_string()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await;

    let order = match inserted {
        Ok(order) => order,
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            txn.rollback().await?;
            tracing::info!(payment_reference = %reference, "concurrent order for reference");
            return find_by_reference(&state.orm, &reference)
                .await?
                .map(OrderOutcome::Existing)
                .ok_or(AppError::NotFound);
        }
        Err(err) => return Err(err.into()),
    };

    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            name: Set(line.name),
            price: Set(line.price),
            quantity: Set(line.quantity),
            category: Set(line.category),
            image: Set(line.image),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        items.push(order_item_from_entity(item));
    }

    txn.commit().await?;

    audit::record(
        &state.orm,
        viewer.map(|u| u.user_id),
        "order_create",
        "orders",
        serde_json::json!({ "order_id": order.id, "payment_reference": reference }),
    )
    .await;
    tracing::info!(order_id = %order.id, total = server_total, "order created");

    Ok(OrderOutcome::Created(OrderWithItems {
        order: order_from_entity(order),
        items,
    }))
}

/// Field-level checks; every failing field is reported.
pub fn validate_request(payload: &CreateOrderRequest) -> AppResult<ShippingAddress> {
    let mut v = Validator::new();
    v.check(
        !payload.items.is_empty(),
        "items",
        "must contain at least one item",
    );
    if !payload.items.is_empty() {
        v.check(
            payload.items.iter().all(|item| item.quantity >= 1),
            "items",
            "every item needs a quantity of at least 1",
        );
    }
    v.check(payload.total > 0, "total", "must be greater than 0");

    let reference = payload.payment_reference.trim();
    if reference.is_empty() {
        v.push("paymentReference", "is required");
    } else {
        v.check(
            is_safe_reference(reference),
            "paymentReference",
            "contains unsupported characters",
        );
    }
    v.email("email", &payload.email);

    let shipping = payload.shipping_address.clone().unwrap_or_default();
    if !shipping.is_complete() {
        let missing: Vec<&str> = [
            ("street", &shipping.street),
            ("city", &shipping.city),
            ("province", &shipping.province),
            ("postalCode", &shipping.postal_code),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();
        v.push(
            "shippingAddress",
            format!("is incomplete: missing {}", missing.join(", ")),
        );
    }

    v.finish()?;
    Ok(shipping)
}

/// Collapse repeated product ids, keeping first-seen order.
fn merge_lines(items: &[OrderItemInput]) -> Vec<(Uuid, i32)> {
    let mut merged: Vec<(Uuid, i32)> = Vec::new();
    for item in items {
        match merged.iter_mut().find(|(id, _)| *id == item.product_id) {
            Some((_, quantity)) => *quantity = quantity.saturating_add(item.quantity),
            None => merged.push((item.product_id, item.quantity)),
        }
    }
    merged
}

/// Re-price against the catalog. Client prices are ignored; the client total
/// must match what the catalog says now.
fn price_lines(
    merged: &[(Uuid, i32)],
    catalog: &HashMap<Uuid, Product>,
    client_total: i64,
) -> AppResult<(Vec<PricedLine>, i64)> {
    let mut v = Validator::new();
    let mut lines = Vec::with_capacity(merged.len());

    for (product_id, quantity) in merged {
        match catalog.get(product_id).filter(|p| p.is_published) {
            None => {
                v.push("items", format!("product {product_id} is not available"));
            }
            Some(product) if product.stock < *quantity => {
                v.push(
                    "items",
                    format!("only {} of {} in stock", product.stock, product.name),
                );
            }
            Some(product) => lines.push(PricedLine {
                product_id: product.id,
                name: product.name.clone(),
                price: product.price,
                quantity: *quantity,
                category: product.category.clone(),
                image: product.primary_image().to_string(),
            }),
        }
    }

    let server_total: i64 = lines
        .iter()
        .map(|line| line.price.saturating_mul(i64::from(line.quantity)))
        .fold(0i64, i64::saturating_add);
    if !v.has_error("items") {
        v.check(
            server_total == client_total,
            "total",
            &format!("does not match current prices (expected {server_total})"),
        );
    }
    v.finish()?;
    Ok((lines, server_total))
}

pub async fn get_order_by_reference(
    state: &AppState,
    reference: &str,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = find_by_reference(&state.orm, reference.trim()).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("OK", order, Some(Meta::empty())))
}

/// Orders placed by the caller, either while signed in or with their email.
pub async fn list_my_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(
        Condition::any()
            .add(OrderCol::UserId.eq(user.user_id))
            .add(OrderCol::Email.eq(normalize_email(&user.email))),
    );
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let finder = Orders::find()
        .filter(condition)
        .order_by_desc(OrderCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

async fn find_by_reference<C: ConnectionTrait>(
    conn: &C,
    reference: &str,
) -> AppResult<Option<OrderWithItems>> {
    let order = Orders::find()
        .filter(OrderCol::PaymentReference.eq(reference))
        .one(conn)
        .await?;
    match order {
        Some(order) => Ok(Some(with_items(conn, order).await?)),
        None => Ok(None),
    }
}

pub async fn with_items<C: ConnectionTrait>(
    conn: &C,
    order: OrderModel,
) -> AppResult<OrderWithItems> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    Ok(OrderWithItems {
        order: order_from_entity(order),
        items,
    })
}

pub fn order_from_entity(model: OrderModel) -> Order {
    let status = model.status.parse::<OrderStatus>().unwrap_or_else(|_| {
        tracing::warn!(order_id = %model.id, status = %model.status, "unknown stored order status");
        OrderStatus::Pending
    });
    Order {
        id: model.id,
        payment_reference: model.payment_reference,
        user_id: model.user_id,
        email: model.email,
        total: model.total,
        status,
        shipping_address: ShippingAddress {
            street: model.shipping_street,
            city: model.shipping_city,
            province: model.shipping_province,
            postal_code: model.shipping_postal_code,
        },
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        name: model.name,
        price: model.price,
        quantity: model.quantity,
        category: model.category,
        image: model.image,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
