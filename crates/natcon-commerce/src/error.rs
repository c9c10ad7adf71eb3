//! Commerce error types.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::checkout::OrderApiError;

/// Errors raised by cart operations and configuration.
#[derive(Error, Debug)]
pub enum CommerceError {
    /// Quantity below one on add.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// Negative unit price on add.
    #[error("Invalid unit price: {0}")]
    InvalidPrice(i64),

    /// Quantity exceeds maximum allowed.
    #[error("Quantity {0} exceeds maximum allowed ({1})")]
    QuantityExceedsLimit(i64, i64),

    /// Arithmetic overflow.
    #[error("Arithmetic overflow in money calculation")]
    Overflow,

    /// Two line items share a key.
    #[error("Duplicate line item: {0}")]
    DuplicateItem(String),

    /// Currency code not recognised.
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    /// Storage error.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl CommerceError {
    /// Whether this is a local validation condition (bad input, cart
    /// untouched) rather than an infrastructure failure.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CommerceError::InvalidQuantity(_)
                | CommerceError::InvalidPrice(_)
                | CommerceError::QuantityExceedsLimit(..)
                | CommerceError::Overflow
        )
    }
}

impl From<natcon_cache::CacheError> for CommerceError {
    fn from(e: natcon_cache::CacheError) -> Self {
        CommerceError::StorageError(e.to_string())
    }
}

impl From<serde_json::Error> for CommerceError {
    fn from(e: serde_json::Error) -> Self {
        CommerceError::SerializationError(e.to_string())
    }
}

impl From<toml::de::Error> for CommerceError {
    fn from(e: toml::de::Error) -> Self {
        CommerceError::ConfigError(e.to_string())
    }
}

/// A problem with one input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name as shown to the form (`email`, `cart`, ...).
    pub field: String,
    /// Human-readable message.
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Every offending field found while validating a checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a problem with `field`.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Merge another set of errors into this one.
    pub fn extend(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Check if `field` has at least one error.
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// First message recorded for `field`.
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Reasons a checkout submission did not produce an order.
#[derive(Error, Debug, Clone)]
pub enum CheckoutError {
    /// Local validation failed; nothing was sent.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Another submission is in flight.
    #[error("Submission already in progress")]
    AlreadySubmitting,

    /// This checkout already produced an order.
    #[error("Checkout already completed")]
    AlreadyCompleted,

    /// The order API refused or could not be reached.
    #[error("Order submission failed: {0}")]
    Rejected(OrderApiError),

    /// The response arrived after the checkout was torn down.
    #[error("Checkout was torn down before the response arrived")]
    Discarded,
}

impl CheckoutError {
    /// Whether calling `submit` again may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            CheckoutError::Validation(_) => true,
            CheckoutError::Rejected(e) => e.retryable,
            CheckoutError::AlreadySubmitting
            | CheckoutError::AlreadyCompleted
            | CheckoutError::Discarded => false,
        }
    }
}
