//! Read-only cart views handed to consumers.

use serde::{Deserialize, Serialize};

use crate::cart::{Cart, LineItem, LineItemKey};
use crate::money::{Currency, Money};

/// An owned copy of the cart at one point in time.
///
/// Totals are computed from the items when the snapshot is taken, so they
/// always agree with `items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    /// Items in insertion order.
    pub items: Vec<LineItem>,
    /// Sum of line totals.
    pub subtotal: Money,
    /// Sum of quantities.
    pub item_count: i64,
    /// Cart currency.
    pub currency: Currency,
    /// Number of successful mutations the store had applied when this
    /// snapshot was taken.
    pub revision: u64,
}

impl CartSnapshot {
    /// Capture `cart` as of `revision`.
    pub fn capture(cart: &Cart, revision: u64) -> Self {
        Self {
            items: cart.items().to_vec(),
            subtotal: cart.subtotal(),
            item_count: cart.item_count(),
            currency: cart.currency(),
            revision,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn unique_item_count(&self) -> usize {
        self.items.len()
    }

    pub fn get_item(&self, key: &LineItemKey) -> Option<&LineItem> {
        self.items.iter().find(|i| &i.key == key)
    }
}
