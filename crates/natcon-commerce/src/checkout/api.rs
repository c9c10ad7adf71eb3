//! The order submission contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::CartSnapshot;
use crate::checkout::{ContactInfo, OrderStatus};
use crate::ids::{IdempotencyKey, OrderId, ProductId};
use crate::money::Currency;

/// One line of an order request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequestItem {
    pub product_id: ProductId,
    pub variant: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub display_name: String,
}

/// Body of an order submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub items: Vec<OrderRequestItem>,
    pub currency: Currency,
    pub contact: ContactInfo,
    pub idempotency_key: IdempotencyKey,
}

impl OrderRequest {
    pub fn new(cart: &CartSnapshot, contact: ContactInfo, idempotency_key: IdempotencyKey) -> Self {
        Self {
            items: cart
                .items
                .iter()
                .map(|item| OrderRequestItem {
                    product_id: item.key.product_id.clone(),
                    variant: item.key.variant.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price.amount_minor,
                    display_name: item.display_name.clone(),
                })
                .collect(),
            currency: cart.currency,
            contact,
            idempotency_key,
        }
    }
}

/// What the order API answers with.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OrderResponse {
    Accepted {
        #[serde(rename = "orderId")]
        order_id: OrderId,
        #[serde(default)]
        status: Option<String>,
    },
    Rejected {
        #[serde(rename = "errorCode")]
        error_code: String,
        message: String,
        #[serde(default)]
        retryable: Option<bool>,
    },
}

impl OrderResponse {
    /// Interpret the body. `retryable_by_default` applies when a rejection
    /// does not say whether it is retryable.
    pub fn into_result(
        self,
        retryable_by_default: bool,
    ) -> Result<OrderConfirmation, OrderApiError> {
        match self {
            OrderResponse::Accepted { order_id, status } => Ok(OrderConfirmation {
                order_id,
                status: OrderStatus::from_api(status.as_deref()),
            }),
            OrderResponse::Rejected {
                error_code,
                message,
                retryable,
            } => Err(OrderApiError::new(
                error_code,
                message,
                retryable.unwrap_or(retryable_by_default),
            )),
        }
    }
}

/// An accepted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderConfirmation {
    pub order_id: OrderId,
    pub status: OrderStatus,
}

impl OrderConfirmation {
    pub fn new(order_id: impl Into<OrderId>) -> Self {
        Self {
            order_id: order_id.into(),
            status: OrderStatus::Confirmed,
        }
    }
}

/// A failed submission, as shown to the buyer.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message} ({error_code})")]
#[serde(rename_all = "camelCase")]
pub struct OrderApiError {
    pub error_code: String,
    pub message: String,
    pub retryable: bool,
}

impl OrderApiError {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            retryable,
        }
    }

    /// The API could not be reached or did not answer in time.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new("network_error", message, true)
    }

    /// The API answered with something that is not an order response.
    pub fn invalid_response(message: impl Into<String>, retryable: bool) -> Self {
        Self::new("invalid_response", message, retryable)
    }
}

/// Submits orders to the commerce backend.
#[async_trait]
pub trait OrderApi: Send + Sync {
    /// Submit `request`. Repeating a request with the same idempotency key
    /// must not create a second order.
    async fn submit_order(&self, request: &OrderRequest)
        -> Result<OrderConfirmation, OrderApiError>;
}
