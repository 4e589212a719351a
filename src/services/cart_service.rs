use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    cart::CartItem,
    dto::cart::{CartQuote, QuoteLine, QuoteRequest},
    error::AppResult,
    models::Product,
    response::{ApiResponse, Meta},
    services::product_service,
    state::AppState,
};

/// Re-check a client-held cart against the live catalog.
///
/// The client cart is a cache: prices and availability returned here win.
pub async fn quote_cart(
    state: &AppState,
    payload: QuoteRequest,
) -> AppResult<ApiResponse<CartQuote>> {
    let ids: Vec<Uuid> = payload
        .items
        .iter()
        .filter_map(|item| Uuid::parse_str(&item.product_id).ok())
        .collect();
    let catalog = product_service::find_by_ids(&state.orm, &ids).await?;
    let quote = build_quote(&payload.items, &catalog);
    Ok(ApiResponse::success("Cart quote", quote, Some(Meta::empty())))
}

pub fn build_quote(items: &[CartItem], catalog: &HashMap<Uuid, Product>) -> CartQuote {
    let lines: Vec<QuoteLine> = items.iter().map(|item| quote_line(item, catalog)).collect();

    let total = lines
        .iter()
        .filter(|line| line.available)
        .map(|line| line.line_total)
        .fold(0i64, i64::saturating_add);
    let item_count = lines
        .iter()
        .filter(|line| line.available)
        .map(|line| u64::from(line.quantity))
        .fold(0u64, u64::saturating_add);
    let checkout_ready = !lines.is_empty() && lines.iter().all(|line| line.available);

    CartQuote {
        lines,
        total,
        item_count,
        checkout_ready,
    }
}

fn quote_line(item: &CartItem, catalog: &HashMap<Uuid, Product>) -> QuoteLine {
    let product = Uuid::parse_str(&item.product_id)
        .ok()
        .and_then(|id| catalog.get(&id))
        .filter(|product| product.is_published);

    let mut line = QuoteLine {
        product_id: item.product_id.clone(),
        name: item.name.clone(),
        quantity: item.quantity,
        client_price: item.price,
        price: item.price,
        line_total: 0,
        stock: 0,
        available: false,
        price_changed: false,
        issue: None,
    };

    let Some(product) = product else {
        line.issue = Some("no longer available".into());
        return line;
    };

    line.name = product.name.clone();
    line.price = product.price;
    line.stock = product.stock;
    line.price_changed = product.price != item.price;

    if item.quantity == 0 {
        line.issue = Some("quantity must be at least 1".into());
    } else if i64::from(item.quantity) > i64::from(product.stock) {
        line.issue = Some(format!("only {} in stock", product.stock));
    } else {
        line.available = true;
        line.line_total = product.price.saturating_mul(i64::from(item.quantity));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(price: i64, stock: i32) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4(),
            name: "Sunflower".into(),
            description: "Giant".into(),
            price,
            images: vec![],
            category: "seeds".into(),
            subcategory: None,
            key_features: vec!["Tall".into()],
            stock,
            in_stock: stock > 0,
            is_published: true,
            is_featured: false,
            weight: None,
            dimensions: None,
            rating: 0.0,
            sales_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn cart_line(product_id: String, price: i64, quantity: u32) -> CartItem {
        CartItem {
            product_id,
            name: "Cached name".into(),
            price,
            quantity,
            image: String::new(),
            category: "seeds".into(),
        }
    }

    #[test]
    fn catalog_price_wins_over_cached_price() {
        let sunflower = product(120, 5);
        let catalog = HashMap::from([(sunflower.id, sunflower.clone())]);
        let quote = build_quote(&[cart_line(sunflower.id.to_string(), 100, 2)], &catalog);

        assert!(quote.checkout_ready);
        assert_eq!(quote.total, 240);
        assert_eq!(quote.item_count, 2);
        assert!(quote.lines[0].price_changed);
        assert_eq!(quote.lines[0].name, "Sunflower");
    }

    #[test]
    fn unknown_and_short_lines_block_checkout() {
        let sunflower = product(120, 1);
        let catalog = HashMap::from([(sunflower.id, sunflower.clone())]);
        let quote = build_quote(
            &[
                cart_line(sunflower.id.to_string(), 120, 3),
                cart_line("not-a-uuid".into(), 50, 1),
            ],
            &catalog,
        );

        assert!(!quote.checkout_ready);
        assert_eq!(quote.total, 0);
        assert_eq!(quote.lines[0].issue.as_deref(), Some("only 1 in stock"));
        assert_eq!(quote.lines[1].issue.as_deref(), Some("no longer available"));
    }

    #[test]
    fn empty_cart_is_not_ready() {
        let quote = build_quote(&[], &HashMap::new());
        assert!(!quote.checkout_ready);
        assert_eq!(quote.total, 0);
    }

    #[test]
    fn huge_catalog_prices_saturate() {
        let first = product(i64::MAX, 5);
        let second = product(10, 5);
        let catalog = HashMap::from([(first.id, first.clone()), (second.id, second.clone())]);
        let quote = build_quote(
            &[
                cart_line(first.id.to_string(), 1, 2),
                cart_line(second.id.to_string(), 10, 1),
            ],
            &catalog,
        );

        assert_eq!(quote.lines[0].line_total, i64::MAX);
        assert_eq!(quote.total, i64::MAX);
        assert_eq!(quote.item_count, 3);
    }
}
