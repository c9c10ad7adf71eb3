//! Cart and line item types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CommerceError;
use crate::ids::ProductId;
use crate::money::{Currency, Money};

/// Default maximum quantity allowed per line item.
pub const MAX_QUANTITY_PER_ITEM: i64 = 9999;

/// Identity of a line item: one product in one variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemKey {
    pub product_id: ProductId,
    pub variant: String,
}

impl LineItemKey {
    pub fn new(product_id: impl Into<ProductId>, variant: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            variant: variant.into(),
        }
    }
}

impl fmt::Display for LineItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.variant.is_empty() {
            write!(f, "{}", self.product_id)
        } else {
            write!(f, "{}/{}", self.product_id, self.variant)
        }
    }
}

/// Limits applied to every cart mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLimits {
    pub max_quantity_per_item: i64,
}

impl Default for CartLimits {
    fn default() -> Self {
        Self {
            max_quantity_per_item: MAX_QUANTITY_PER_ITEM,
        }
    }
}

/// Outcome of [`Cart::update_quantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// The item now has the requested quantity.
    Updated,
    /// The requested quantity was zero or below, so the item is gone.
    Removed,
    /// No item has that key; nothing changed.
    NotFound,
}

impl QuantityChange {
    /// Whether the cart was modified.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, QuantityChange::NotFound)
    }
}

/// A shopping cart.
///
/// Keys are unique, quantities stay within `1..=max_quantity_per_item`, and
/// every line total, the subtotal and the item count fit in an `i64`. A mutation that would
/// break any of these is rejected and leaves the cart as it was.
#[derive(Debug, Clone, PartialEq)]
pub struct Cart {
    items: Vec<LineItem>,
    currency: Currency,
    limits: CartLimits,
}

impl Cart {
    /// Create an empty cart.
    pub fn new(currency: Currency) -> Self {
        Self::with_limits(currency, CartLimits::default())
    }

    /// Create an empty cart with custom limits.
    pub fn with_limits(currency: Currency, limits: CartLimits) -> Self {
        Self {
            items: Vec::new(),
            currency,
            limits,
        }
    }

    /// Rebuild a cart from previously stored line items.
    ///
    /// Applies the same invariants as live mutations; duplicate keys are an
    /// error rather than being merged.
    pub fn restore(
        currency: Currency,
        limits: CartLimits,
        items: impl IntoIterator<Item = LineItem>,
    ) -> Result<Self, CommerceError> {
        let mut cart = Self::with_limits(currency, limits);
        for mut item in items {
            if cart.get_item(&item.key).is_some() {
                return Err(CommerceError::DuplicateItem(item.key.to_string()));
            }
            item.unit_price.currency = currency;
            cart.validate_new(item.quantity, item.unit_price.amount_minor)?;
            cart.check_limit(item.quantity)?;
            cart.projected_subtotal(&item.key, item.unit_price.amount_minor, item.quantity)?;
            cart.projected_item_count(&item.key, item.quantity)?;
            cart.items.push(item);
        }
        Ok(cart)
    }

    /// Add an item to the cart.
    ///
    /// An existing line with the same key absorbs the quantity and keeps its
    /// original price and name. Returns an error if:
    /// - Quantity is below one or the price is negative
    /// - The resulting quantity would exceed the per-item limit
    /// - The line total or subtotal would overflow
    pub fn add_item(
        &mut self,
        product_id: impl Into<ProductId>,
        variant: impl Into<String>,
        quantity: i64,
        unit_price: i64,
        display_name: impl Into<String>,
    ) -> Result<LineItemKey, CommerceError> {
        self.validate_new(quantity, unit_price)?;
        let key = LineItemKey::new(product_id, variant);

        if let Some(index) = self.position(&key) {
            let existing = &self.items[index];
            let new_quantity = existing
                .quantity
                .checked_add(quantity)
                .ok_or(CommerceError::Overflow)?;
            self.check_limit(new_quantity)?;
            self.projected_subtotal(&key, existing.unit_price.amount_minor, new_quantity)?;
            self.projected_item_count(&key, new_quantity)?;

            self.items[index].quantity = new_quantity;
            return Ok(key);
        }

        self.check_limit(quantity)?;
        self.projected_subtotal(&key, unit_price, quantity)?;
        self.projected_item_count(&key, quantity)?;

        self.items.push(LineItem {
            key: key.clone(),
            quantity,
            unit_price: Money::new(unit_price, self.currency),
            display_name: display_name.into(),
        });
        Ok(key)
    }

    /// Set an item's quantity.
    ///
    /// A quantity of zero or below removes the item.
    pub fn update_quantity(
        &mut self,
        key: &LineItemKey,
        quantity: i64,
    ) -> Result<QuantityChange, CommerceError> {
        let Some(index) = self.position(key) else {
            return Ok(QuantityChange::NotFound);
        };

        if quantity <= 0 {
            self.items.remove(index);
            return Ok(QuantityChange::Removed);
        }

        self.check_limit(quantity)?;
        self.projected_subtotal(key, self.items[index].unit_price.amount_minor, quantity)?;
        self.projected_item_count(key, quantity)?;
        self.items[index].quantity = quantity;
        Ok(QuantityChange::Updated)
    }

    /// Remove an item from the cart.
    pub fn remove_item(&mut self, key: &LineItemKey) -> bool {
        let len_before = self.items.len();
        self.items.retain(|i| &i.key != key);
        self.items.len() < len_before
    }

    /// Clear all items from the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Items in insertion order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn limits(&self) -> CartLimits {
        self.limits
    }

    /// Sum of `unit_price * quantity`, recomputed on every call.
    pub fn subtotal(&self) -> Money {
        let total = self
            .items
            .iter()
            .fold(0_i64, |acc, item| acc.saturating_add(item.line_total().amount_minor));
        Money::new(total, self.currency)
    }

    /// Get total item count (sum of quantities).
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Get number of distinct line items.
    pub fn unique_item_count(&self) -> usize {
        self.items.len()
    }

    /// Check if cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get an item by key.
    pub fn get_item(&self, key: &LineItemKey) -> Option<&LineItem> {
        self.items.iter().find(|i| &i.key == key)
    }

    fn position(&self, key: &LineItemKey) -> Option<usize> {
        self.items.iter().position(|i| &i.key == key)
    }

    fn validate_new(&self, quantity: i64, unit_price: i64) -> Result<(), CommerceError> {
        if quantity < 1 {
            return Err(CommerceError::InvalidQuantity(quantity));
        }
        if unit_price < 0 {
            return Err(CommerceError::InvalidPrice(unit_price));
        }
        Ok(())
    }

    fn check_limit(&self, quantity: i64) -> Result<(), CommerceError> {
        if quantity > self.limits.max_quantity_per_item {
            return Err(CommerceError::QuantityExceedsLimit(
                quantity,
                self.limits.max_quantity_per_item,
            ));
        }
        Ok(())
    }

    /// Subtotal the cart would have if the line `key` were priced at
    /// `unit_price * quantity`; errors if any step overflows.
    fn projected_subtotal(
        &self,
        key: &LineItemKey,
        unit_price: i64,
        quantity: i64,
    ) -> Result<Money, CommerceError> {
        let mut total = Money::new(unit_price, self.currency)
            .try_multiply(quantity)
            .ok_or(CommerceError::Overflow)?;
        for item in self.items.iter().filter(|i| &i.key != key) {
            total = total
                .try_add(&item.line_total())
                .ok_or(CommerceError::Overflow)?;
        }
        Ok(total)
    }

    /// Item count the cart would have if the line `key` held `quantity`.
    fn projected_item_count(
        &self,
        key: &LineItemKey,
        quantity: i64,
    ) -> Result<i64, CommerceError> {
        self.items
            .iter()
            .filter(|i| &i.key != key)
            .try_fold(quantity, |count, item| count.checked_add(item.quantity))
            .ok_or(CommerceError::Overflow)
    }
}

/// A line item in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Product and variant.
    pub key: LineItemKey,
    /// Quantity, always at least one.
    pub quantity: i64,
    /// Unit price.
    pub unit_price: Money,
    /// Product name shown in the cart.
    pub display_name: String,
}

impl LineItem {
    pub fn product_id(&self) -> &ProductId {
        &self.key.product_id
    }

    pub fn variant(&self) -> &str {
        &self.key.variant
    }

    /// `unit_price * quantity`.
    pub fn line_total(&self) -> Money {
        Money::new(
            self.unit_price.amount_minor.saturating_mul(self.quantity),
            self.unit_price.currency,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart() -> Cart {
        Cart::new(Currency::USD)
    }

    #[test]
    fn test_add_item() {
        let mut cart = cart();
        cart.add_item("tshirt", "M", 2, 1500, "NatCon Tee").unwrap();

        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.unique_item_count(), 1);
        assert_eq!(cart.subtotal().amount_minor, 3000);
    }

    #[test]
    fn test_add_same_key_merges() {
        let mut cart = cart();
        cart.add_item("tshirt", "M", 2, 1500, "NatCon Tee").unwrap();
        let key = cart.add_item("tshirt", "M", 1, 1500, "NatCon Tee").unwrap();

        assert_eq!(cart.unique_item_count(), 1);
        assert_eq!(cart.get_item(&key).unwrap().quantity, 3);
        assert_eq!(cart.subtotal().amount_minor, 4500);
    }

    #[test]
    fn test_merge_keeps_first_price() {
        let mut cart = cart();
        let key = cart.add_item("mug", "", 1, 1200, "Mug").unwrap();
        cart.add_item("mug", "", 1, 900, "Mug (sale)").unwrap();

        let item = cart.get_item(&key).unwrap();
        assert_eq!(item.unit_price.amount_minor, 1200);
        assert_eq!(item.display_name, "Mug");
        assert_eq!(cart.subtotal().amount_minor, 2400);
    }

    #[test]
    fn test_variants_are_distinct_lines() {
        let mut cart = cart();
        cart.add_item("tshirt", "M", 1, 1500, "Tee").unwrap();
        cart.add_item("tshirt", "L", 1, 1500, "Tee").unwrap();
        assert_eq!(cart.unique_item_count(), 2);
        assert_eq!(cart.items()[0].variant(), "M");
        assert_eq!(cart.items()[1].variant(), "L");
    }

    #[test]
    fn test_add_rejects_bad_input() {
        let mut cart = cart();
        assert!(matches!(
            cart.add_item("tshirt", "M", 0, 1500, "Tee"),
            Err(CommerceError::InvalidQuantity(0))
        ));
        assert!(matches!(
            cart.add_item("tshirt", "M", 1, -1, "Tee"),
            Err(CommerceError::InvalidPrice(-1))
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_quantity_limit() {
        let mut cart = Cart::with_limits(
            Currency::USD,
            CartLimits {
                max_quantity_per_item: 5,
            },
        );
        let key = cart.add_item("lanyard", "", 4, 300, "Lanyard").unwrap();
        let result = cart.add_item("lanyard", "", 2, 300, "Lanyard");

        assert!(matches!(result, Err(CommerceError::QuantityExceedsLimit(6, 5))));
        assert_eq!(cart.get_item(&key).unwrap().quantity, 4);
        assert!(cart.update_quantity(&key, 6).is_err());
    }

    #[test]
    fn test_overflow_leaves_cart_unchanged() {
        let mut cart = Cart::with_limits(
            Currency::USD,
            CartLimits {
                max_quantity_per_item: i64::MAX,
            },
        );
        cart.add_item("a", "", 1, i64::MAX - 10, "A").unwrap();
        let result = cart.add_item("b", "", 1, 20, "B");

        assert!(matches!(result, Err(CommerceError::Overflow)));
        assert_eq!(cart.unique_item_count(), 1);
    }

    #[test]
    fn test_item_count_overflow_rejected() {
        let mut cart = Cart::with_limits(
            Currency::USD,
            CartLimits {
                max_quantity_per_item: i64::MAX,
            },
        );
        let badge = cart.add_item("badge", "", i64::MAX, 0, "Badge").unwrap();
        let result = cart.add_item("sticker", "", 1, 0, "Sticker");

        assert!(matches!(result, Err(CommerceError::Overflow)));
        assert_eq!(cart.unique_item_count(), 1);
        assert_eq!(cart.item_count(), i64::MAX);

        cart.update_quantity(&badge, i64::MAX - 1).unwrap();
        let sticker = cart.add_item("sticker", "", 1, 0, "Sticker").unwrap();
        assert!(matches!(
            cart.update_quantity(&sticker, 2),
            Err(CommerceError::Overflow)
        ));
        assert_eq!(cart.item_count(), i64::MAX);
    }

    #[test]
    fn test_restore_rejects_item_count_overflow() {
        let limits = CartLimits {
            max_quantity_per_item: i64::MAX,
        };
        let items = ["badge", "sticker"].map(|id| LineItem {
            key: LineItemKey::new(id, ""),
            quantity: i64::MAX,
            unit_price: Money::new(0, Currency::USD),
            display_name: id.to_string(),
        });
        assert!(matches!(
            Cart::restore(Currency::USD, limits, items),
            Err(CommerceError::Overflow)
        ));
    }

    #[test]
    fn test_update_quantity() {
        let mut cart = cart();
        let key = cart.add_item("tshirt", "M", 1, 1500, "Tee").unwrap();

        assert_eq!(cart.update_quantity(&key, 5).unwrap(), QuantityChange::Updated);
        assert_eq!(cart.item_count(), 5);
        assert_eq!(cart.subtotal().amount_minor, 7500);
    }

    #[test]
    fn test_update_to_zero_removes() {
        let mut cart = cart();
        let key = cart.add_item("tshirt", "M", 3, 1500, "Tee").unwrap();

        assert_eq!(cart.update_quantity(&key, 0).unwrap(), QuantityChange::Removed);
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal().amount_minor, 0);
    }

    #[test]
    fn test_update_missing_key() {
        let mut cart = cart();
        let missing = LineItemKey::new("ghost", "");
        assert_eq!(
            cart.update_quantity(&missing, 2).unwrap(),
            QuantityChange::NotFound
        );
        assert_eq!(
            cart.update_quantity(&missing, 0).unwrap(),
            QuantityChange::NotFound
        );
    }

    #[test]
    fn test_remove_item() {
        let mut cart = cart();
        let key = cart.add_item("tshirt", "M", 1, 1500, "Tee").unwrap();

        assert!(cart.remove_item(&key));
        assert!(!cart.remove_item(&key));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_restore_rejects_duplicates() {
        let item = LineItem {
            key: LineItemKey::new("tshirt", "M"),
            quantity: 1,
            unit_price: Money::new(1500, Currency::USD),
            display_name: "Tee".to_string(),
        };
        let result = Cart::restore(
            Currency::USD,
            CartLimits::default(),
            vec![item.clone(), item],
        );
        assert!(matches!(result, Err(CommerceError::DuplicateItem(_))));
    }

    #[test]
    fn test_restore_rejects_zero_quantity() {
        let item = LineItem {
            key: LineItemKey::new("tshirt", "M"),
            quantity: 0,
            unit_price: Money::new(1500, Currency::USD),
            display_name: "Tee".to_string(),
        };
        assert!(Cart::restore(Currency::USD, CartLimits::default(), vec![item]).is_err());
    }

    #[test]
    fn test_key_display() {
        assert_eq!(LineItemKey::new("tshirt", "M").to_string(), "tshirt/M");
        assert_eq!(LineItemKey::new("mug", "").to_string(), "mug");
    }
}
