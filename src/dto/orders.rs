use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Order, OrderItem, ShippingAddress};

/// Missing fields deserialize to empty values so validation can report them together.
#[derive(Debug, Deserialize, ToSchema, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default, deserialize_with = "crate::validation::null_as_default")]
    pub items: Vec<OrderItemInput>,
    #[serde(default, deserialize_with = "crate::validation::null_as_default")]
    pub total: i64,
    #[serde(default, deserialize_with = "crate::validation::null_as_default")]
    pub payment_reference: String,
    #[serde(default, deserialize_with = "crate::validation::null_as_default")]
    pub email: String,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
}

#[derive(Debug, Deserialize, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub product_id: Uuid,
    #[serde(default, deserialize_with = "crate::validation::null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "crate::validation::null_as_default")]
    pub price: i64,
    #[serde(default, deserialize_with = "crate::validation::null_as_default")]
    pub quantity: i32,
    #[serde(default, deserialize_with = "crate::validation::null_as_default")]
    pub category: String,
    #[serde(default, deserialize_with = "crate::validation::null_as_default")]
    pub image: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
