//! Shopping cart module.
//!
//! Contains the cart itself, the session-scoped store that owns it, read-only
//! snapshots, and the persistence adapter.

mod cart;
mod persistence;
mod snapshot;
mod store;

pub use cart::{Cart, CartLimits, LineItem, LineItemKey, QuantityChange, MAX_QUANTITY_PER_ITEM};
pub use persistence::{
    CartPersistence, PersistedCart, PersistedItem, PersistenceWorker, DEFAULT_STORAGE_KEY,
    RECORD_VERSION,
};
pub use snapshot::CartSnapshot;
pub use store::{CartStore, Subscription};
