//! Checkout module.
//!
//! Contains the submission state machine, contact details, orders, and the
//! order API contract with its HTTP implementation.

mod api;
mod contact;
mod flow;
mod http;
mod order;

pub use api::{
    OrderApi, OrderApiError, OrderConfirmation, OrderRequest, OrderRequestItem, OrderResponse,
};
pub use contact::{ContactInfo, MAX_NAME_LENGTH};
pub use flow::{CheckoutOrchestrator, CheckoutState};
pub use http::{HttpOrderApi, IDEMPOTENCY_HEADER};
pub use order::{Order, OrderStatus};
