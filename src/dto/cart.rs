use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::cart::CartItem;

#[derive(Debug, Deserialize, ToSchema)]
pub struct QuoteRequest {
    pub items: Vec<CartItem>,
}

/// One cart line re-priced against the live catalog.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuoteLine {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub client_price: i64,
    pub price: i64,
    pub line_total: i64,
    pub stock: i32,
    pub available: bool,
    pub price_changed: bool,
    pub issue: Option<String>,
}

#[derive(Debug, Serialize, ToSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartQuote {
    pub lines: Vec<QuoteLine>,
    /// Sum over available lines at catalog prices.
    pub total: i64,
    pub item_count: u64,
    pub checkout_ready: bool,
}
