//! Order types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::CartSnapshot;
use crate::checkout::ContactInfo;
use crate::ids::{IdempotencyKey, OrderId};
use crate::money::{Currency, Money};

/// Order status as reported by the order API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Accepted but not yet confirmed.
    Pending,
    /// Order confirmed.
    #[default]
    Confirmed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
        }
    }

    /// Parse a status string; anything unrecognised counts as confirmed.
    pub fn from_api(status: Option<&str>) -> Self {
        match status.map(str::to_ascii_lowercase).as_deref() {
            Some("pending") => OrderStatus::Pending,
            _ => OrderStatus::Confirmed,
        }
    }
}

/// A successfully submitted order.
///
/// Built only from an accepted submission; carries the cart exactly as it
/// was sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub cart: CartSnapshot,
    pub contact: ContactInfo,
    pub idempotency_key: IdempotencyKey,
    pub status: OrderStatus,
    pub placed_at: DateTime<Utc>,
}

impl Order {
    pub fn subtotal(&self) -> Money {
        self.cart.subtotal
    }

    pub fn item_count(&self) -> i64 {
        self.cart.item_count
    }

    pub fn currency(&self) -> Currency {
        self.cart.currency
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_api() {
        assert_eq!(OrderStatus::from_api(Some("PENDING")), OrderStatus::Pending);
        assert_eq!(
            OrderStatus::from_api(Some("confirmed")),
            OrderStatus::Confirmed
        );
        assert_eq!(OrderStatus::from_api(Some("paid")), OrderStatus::Confirmed);
        assert_eq!(OrderStatus::from_api(None), OrderStatus::Confirmed);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&OrderStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
    }
}
