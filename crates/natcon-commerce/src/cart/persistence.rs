//! Bridge between the cart and client-durable storage.
//!
//! Storage problems never reach the cart: a failed read hydrates an empty
//! cart, and a failed write drops the adapter into memory-only mode for the
//! rest of the session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::StreamExt;
use natcon_cache::{Cache, CacheError, KvStore};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::{Cart, CartLimits, LineItem, LineItemKey};
use crate::ids::ProductId;
use crate::money::{Currency, Money};

/// Storage key used when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "natcon:cart";

/// Version tag written into every record.
pub const RECORD_VERSION: u32 = 1;

/// The stored form of a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedCart {
    pub version: u32,
    pub currency: String,
    pub items: Vec<PersistedItem>,
}

/// The stored form of a line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedItem {
    pub product_id: ProductId,
    #[serde(default)]
    pub variant: String,
    pub quantity: i64,
    pub unit_price: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl PersistedCart {
    pub fn from_cart(cart: &Cart) -> Self {
        Self {
            version: RECORD_VERSION,
            currency: cart.currency().code().to_string(),
            items: cart
                .items()
                .iter()
                .map(|item| PersistedItem {
                    product_id: item.key.product_id.clone(),
                    variant: item.key.variant.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price.amount_minor,
                    display_name: Some(item.display_name.clone()),
                })
                .collect(),
        }
    }

    fn into_cart(self, limits: CartLimits) -> Result<Cart, RecordError> {
        let currency = Currency::from_code(&self.currency)
            .ok_or_else(|| RecordError::Malformed(format!("unknown currency {}", self.currency)))?;

        let items = self.items.into_iter().map(|item| {
            let display_name = item
                .display_name
                .unwrap_or_else(|| item.product_id.to_string());
            LineItem {
                key: LineItemKey::new(item.product_id, item.variant),
                quantity: item.quantity,
                unit_price: Money::new(item.unit_price, currency),
                display_name,
            }
        });

        Cart::restore(currency, limits, items).map_err(|e| RecordError::Malformed(e.to_string()))
    }
}

/// Just enough of a record to decide whether the rest is readable.
#[derive(Deserialize)]
struct RecordHeader {
    version: u32,
}

/// Why a stored record was discarded.
#[derive(Debug, Error)]
enum RecordError {
    #[error("unrecognised record version {0}")]
    UnknownVersion(u32),

    #[error("malformed record: {0}")]
    Malformed(String),
}

fn decode(bytes: &[u8], limits: CartLimits) -> Result<Cart, RecordError> {
    let header: RecordHeader =
        serde_json::from_slice(bytes).map_err(|e| RecordError::Malformed(e.to_string()))?;
    if header.version != RECORD_VERSION {
        return Err(RecordError::UnknownVersion(header.version));
    }

    let record: PersistedCart =
        serde_json::from_slice(bytes).map_err(|e| RecordError::Malformed(e.to_string()))?;
    record.into_cart(limits)
}

/// Loads and saves the cart record.
///
/// Cloning shares the capability flag, so every clone sees the adapter go
/// memory-only at the same moment.
#[derive(Clone)]
pub struct CartPersistence {
    cache: Cache,
    key: String,
    available: Arc<AtomicBool>,
}

impl CartPersistence {
    /// Persist under [`DEFAULT_STORAGE_KEY`].
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            cache: Cache::new(store),
            key: DEFAULT_STORAGE_KEY.to_string(),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Persist under a custom key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// `false` once storage has failed; saves are skipped from then on.
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    /// The last saved cart, or an empty one in `currency` when there is no
    /// usable record.
    pub async fn load_initial(&self, currency: Currency, limits: CartLimits) -> Cart {
        let bytes = match self.cache.get_raw(&self.key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                tracing::debug!(key = %self.key, "no saved cart");
                return Cart::with_limits(currency, limits);
            }
            Err(e) => {
                self.mark_unavailable(&e);
                return Cart::with_limits(currency, limits);
            }
        };

        match decode(&bytes, limits) {
            Ok(cart) => {
                tracing::debug!(
                    key = %self.key,
                    items = cart.unique_item_count(),
                    "restored saved cart"
                );
                cart
            }
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "discarding saved cart");
                Cart::with_limits(currency, limits)
            }
        }
    }

    /// Write `cart`. Returns whether the record was written.
    ///
    /// Never fails: a storage error is logged and switches the adapter to
    /// memory-only mode.
    pub async fn save(&self, cart: &Cart) -> bool {
        if !self.is_available() {
            tracing::trace!(key = %self.key, "persistence unavailable, skipping save");
            return false;
        }

        match self.cache.set(&self.key, &PersistedCart::from_cart(cart)).await {
            Ok(()) => true,
            Err(e) => {
                if e.is_capability_loss() {
                    self.mark_unavailable(&e);
                } else {
                    tracing::warn!(key = %self.key, error = %e, "failed to encode cart");
                }
                false
            }
        }
    }

    /// Delete the stored record, best-effort.
    pub async fn clear_record(&self) {
        if !self.is_available() {
            return;
        }
        if let Err(e) = self.cache.delete(&self.key).await {
            self.mark_unavailable(&e);
        }
    }

    fn mark_unavailable(&self, error: &CacheError) {
        if self.available.swap(false, Ordering::AcqRel) {
            tracing::warn!(
                key = %self.key,
                error = %error,
                "cart storage failed; continuing in memory-only mode"
            );
        }
    }
}

/// Producer half of the save pipeline, owned by the cart store.
pub(crate) struct SaveQueue {
    tx: UnboundedSender<Cart>,
    persistence: CartPersistence,
}

impl SaveQueue {
    pub(crate) fn enqueue(&self, cart: &Cart) {
        if !self.persistence.is_available() {
            return;
        }
        if self.tx.unbounded_send(cart.clone()).is_err() {
            tracing::debug!(key = %self.persistence.key(), "persistence worker gone, save dropped");
        }
    }

    pub(crate) fn is_available(&self) -> bool {
        self.persistence.is_available()
    }
}

/// Performs the cart's saves off the mutation path.
///
/// Spawn [`PersistenceWorker::run`] on the session's executor. It completes
/// once every store handle is dropped and the final save is written.
#[must_use = "saves only happen while the worker runs"]
pub struct PersistenceWorker {
    rx: UnboundedReceiver<Cart>,
    persistence: CartPersistence,
}

impl PersistenceWorker {
    pub async fn run(mut self) {
        while let Some(mut cart) = self.rx.next().await {
            // Only the newest state matters.
            while let Ok(Some(newer)) = self.rx.try_next() {
                cart = newer;
            }
            self.persistence.save(&cart).await;
        }
        tracing::debug!(key = %self.persistence.key(), "cart session closed, persistence worker done");
    }
}

pub(crate) fn save_pipeline(persistence: CartPersistence) -> (SaveQueue, PersistenceWorker) {
    let (tx, rx) = mpsc::unbounded();
    (
        SaveQueue {
            tx,
            persistence: persistence.clone(),
        },
        PersistenceWorker { rx, persistence },
    )
}
