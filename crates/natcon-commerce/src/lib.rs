//! Cart and checkout core for the NatCon 2026 store.
//!
//! - **Cart**: line items, totals, and the session-scoped [`CartStore`] that
//!   owns them and notifies subscribers
//! - **Persistence**: best-effort saving of the cart to client storage
//! - **Checkout**: the submission state machine and the order API
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use natcon_cache::MemoryStore;
//! use natcon_commerce::prelude::*;
//!
//! let config = StoreConfig::default();
//! let persistence = CartPersistence::new(Arc::new(MemoryStore::new()));
//! let (cart, worker) =
//!     CartStore::hydrate(persistence, config.currency, config.cart_limits()).await;
//! tokio::task::spawn_local(worker.run());
//!
//! cart.add_item("tshirt", "M", 2, 1500, "NatCon Tee")?;
//!
//! let checkout = CheckoutOrchestrator::new(cart.clone(), Arc::new(HttpOrderApi::from_config(&config.order_api)?));
//! let order = checkout.submit(ContactInfo::new("Ada", "ada@example.org")).await?;
//! println!("Order {} placed", order.id);
//! ```

pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod ids;
pub mod money;

pub use cart::{CartSnapshot, CartStore};
pub use checkout::CheckoutOrchestrator;
pub use config::StoreConfig;
pub use error::{CheckoutError, CommerceError, FieldError, ValidationErrors};
pub use ids::*;
pub use money::{Currency, Money};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{OrderApiConfig, StoreConfig};
    pub use crate::error::{CheckoutError, CommerceError, FieldError, ValidationErrors};
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};

    // Cart
    pub use crate::cart::{
        Cart, CartLimits, CartPersistence, CartSnapshot, CartStore, LineItem, LineItemKey,
        PersistenceWorker, QuantityChange, Subscription,
    };

    // Checkout
    pub use crate::checkout::{
        CheckoutOrchestrator, CheckoutState, ContactInfo, HttpOrderApi, Order, OrderApi,
        OrderApiError, OrderConfirmation, OrderRequest, OrderStatus,
    };
}
