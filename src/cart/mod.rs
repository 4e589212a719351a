//! Client-owned shopping cart.
//!
//! The cart never lives on the server: [`reduce`] is the pure transition
//! function, [`CartStore`] wraps it with persistence to per-client storage,
//! and prices are re-checked by the server only at quote/checkout time.

mod store;

pub use store::{CartError, CartStorage, CartStore, FileStorage, MemoryStorage, STORAGE_KEY};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product identity; two lines with the same id are merged.
    pub product_id: String,
    pub name: String,
    pub price: i64,
    pub quantity: u32,
    pub image: String,
    pub category: String,
}

impl CartItem {
    /// Saturates instead of overflowing on absurd price or quantity values.
    pub fn line_total(&self) -> i64 {
        self.price.saturating_mul(i64::from(self.quantity))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartState {
    pub items: Vec<CartItem>,
    pub total: i64,
    pub item_count: u64,
}

impl CartState {
    fn from_items(items: Vec<CartItem>) -> Self {
        let total = items
            .iter()
            .map(CartItem::line_total)
            .fold(0i64, i64::saturating_add);
        let item_count = items
            .iter()
            .map(|item| u64::from(item.quantity))
            .fold(0u64, u64::saturating_add);
        Self {
            items,
            total,
            item_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CartAction {
    AddItem(CartItem),
    RemoveItem { id: String },
    UpdateQuantity { id: String, quantity: u32 },
    ClearCart,
}

/// Apply one action. Totals are always recomputed from the whole item list.
///
/// `UpdateQuantity` does not clamp; limiting to stock happens before dispatch.
pub fn reduce(state: &CartState, action: CartAction) -> CartState {
    match action {
        CartAction::AddItem(item) => {
            let mut items = state.items.clone();
            match items
                .iter_mut()
                .find(|existing| existing.product_id == item.product_id)
            {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(item.quantity)
                }
                None => items.push(item),
            }
            CartState::from_items(items)
        }
        CartAction::RemoveItem { id } => CartState::from_items(
            state
                .items
                .iter()
                .filter(|item| item.product_id != id)
                .cloned()
                .collect(),
        ),
        CartAction::UpdateQuantity { id, quantity } => CartState::from_items(
            state
                .items
                .iter()
                .cloned()
                .map(|mut item| {
                    if item.product_id == id {
                        item.quantity = quantity;
                    }
                    item
                })
                .collect(),
        ),
        CartAction::ClearCart => CartState::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, price: i64, quantity: u32) -> CartItem {
        CartItem {
            product_id: id.to_string(),
            name: format!("Product {id}"),
            price,
            quantity,
            image: format!("https://cdn.example.com/{id}.jpg"),
            category: "seeds".to_string(),
        }
    }

    fn apply(actions: Vec<CartAction>) -> CartState {
        actions
            .into_iter()
            .fold(CartState::default(), |state, action| reduce(&state, action))
    }

    fn assert_consistent(state: &CartState) {
        let total: i64 = state.items.iter().map(|i| i.price * i64::from(i.quantity)).sum();
        let count: u64 = state.items.iter().map(|i| u64::from(i.quantity)).sum();
        assert_eq!(state.total, total);
        assert_eq!(state.item_count, count);
    }

    #[test]
    fn two_lines_sum_to_expected_totals() {
        let state = apply(vec![
            CartAction::AddItem(item("a", 100, 2)),
            CartAction::AddItem(item("b", 50, 1)),
        ]);
        assert_eq!(state.total, 250);
        assert_eq!(state.item_count, 3);
        assert_eq!(state.items.len(), 2);
    }

    #[test]
    fn adding_existing_product_merges_quantity() {
        let merged = apply(vec![
            CartAction::AddItem(item("a", 100, 2)),
            CartAction::AddItem(item("b", 50, 1)),
            CartAction::AddItem(item("a", 100, 3)),
        ]);
        let updated = apply(vec![
            CartAction::AddItem(item("a", 100, 2)),
            CartAction::AddItem(item("b", 50, 1)),
            CartAction::UpdateQuantity {
                id: "a".into(),
                quantity: 5,
            },
        ]);
        assert_eq!(merged, updated);
        assert_eq!(merged.items[0].quantity, 5);
    }

    #[test]
    fn remove_then_add_keeps_list_shape() {
        let original = apply(vec![
            CartAction::AddItem(item("a", 100, 2)),
            CartAction::AddItem(item("b", 50, 1)),
        ]);
        let removed = reduce(&original, CartAction::RemoveItem { id: "a".into() });
        assert_eq!(removed.items.len(), 1);
        let restored = reduce(&removed, CartAction::AddItem(item("a", 100, 2)));

        let mut before = original.items.clone();
        let mut after = restored.items.clone();
        before.sort_by(|x, y| x.product_id.cmp(&y.product_id));
        after.sort_by(|x, y| x.product_id.cmp(&y.product_id));
        assert_eq!(before, after);
        assert_eq!(original.total, restored.total);
        assert_eq!(original.item_count, restored.item_count);
    }

    #[test]
    fn update_quantity_is_not_clamped() {
        let state = apply(vec![
            CartAction::AddItem(item("a", 10, 1)),
            CartAction::UpdateQuantity {
                id: "a".into(),
                quantity: 999,
            },
        ]);
        assert_eq!(state.items[0].quantity, 999);
        assert_eq!(state.total, 9990);
    }

    #[test]
    fn unknown_ids_leave_state_untouched() {
        let state = apply(vec![CartAction::AddItem(item("a", 10, 1))]);
        let removed = reduce(&state, CartAction::RemoveItem { id: "zzz".into() });
        let updated = reduce(
            &state,
            CartAction::UpdateQuantity {
                id: "zzz".into(),
                quantity: 4,
            },
        );
        assert_eq!(removed, state);
        assert_eq!(updated, state);
    }

    #[test]
    fn clear_resets_everything() {
        let state = apply(vec![
            CartAction::AddItem(item("a", 10, 1)),
            CartAction::ClearCart,
        ]);
        assert!(state.is_empty());
        assert_eq!(state, CartState::default());
    }

    #[test]
    fn totals_hold_after_every_transition() {
        let actions = vec![
            CartAction::AddItem(item("a", 100, 2)),
            CartAction::AddItem(item("b", 50, 1)),
            CartAction::AddItem(item("c", 7, 9)),
            CartAction::UpdateQuantity {
                id: "b".into(),
                quantity: 4,
            },
            CartAction::AddItem(item("a", 100, 1)),
            CartAction::RemoveItem { id: "c".into() },
            CartAction::AddItem(item("d", 1, 1)),
            CartAction::ClearCart,
            CartAction::AddItem(item("e", 3, 3)),
        ];
        let mut state = CartState::default();
        for action in actions {
            state = reduce(&state, action);
            assert_consistent(&state);
        }
    }

    #[test]
    fn actions_use_tagged_wire_format() {
        let json = serde_json::json!({
            "type": "UPDATE_QUANTITY",
            "payload": { "id": "a", "quantity": 3 }
        });
        let action: CartAction = serde_json::from_value(json).expect("decode action");
        assert_eq!(
            action,
            CartAction::UpdateQuantity {
                id: "a".into(),
                quantity: 3
            }
        );

        let clear: CartAction =
            serde_json::from_value(serde_json::json!({ "type": "CLEAR_CART" })).expect("clear");
        assert_eq!(clear, CartAction::ClearCart);
    }

    #[test]
    fn huge_quantities_and_prices_saturate() {
        let state = apply(vec![
            CartAction::AddItem(item("a", 10, u32::MAX)),
            CartAction::AddItem(item("a", 10, u32::MAX)),
        ]);
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.items[0].quantity, u32::MAX);
        assert_eq!(state.item_count, u64::from(u32::MAX));
        assert_eq!(state.total, 10 * i64::from(u32::MAX));

        let state = reduce(&state, CartAction::AddItem(item("b", i64::MAX, 2)));
        assert_eq!(state.items[1].line_total(), i64::MAX);
        assert_eq!(state.total, i64::MAX);
    }
}
