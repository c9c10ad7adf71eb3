//! The session-scoped cart store.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::cart::persistence::{save_pipeline, SaveQueue};
use crate::cart::{
    Cart, CartLimits, CartPersistence, CartSnapshot, LineItemKey, PersistenceWorker,
    QuantityChange,
};
use crate::error::CommerceError;
use crate::ids::{ProductId, SessionId};
use crate::money::Currency;

type Listener = Rc<dyn Fn(&CartSnapshot)>;

struct StoreState {
    cart: Cart,
    revision: u64,
}

struct StoreInner {
    session_id: SessionId,
    state: RefCell<StoreState>,
    listeners: RefCell<Vec<(u64, Listener)>>,
    next_listener: Cell<u64>,
    saves: Option<SaveQueue>,
}

/// Sole owner of the session's cart.
///
/// `CartStore` is a cheap handle; clones share the same cart. Every
/// successful mutation notifies subscribers synchronously with a fresh
/// snapshot and queues a save on the [`PersistenceWorker`]. Rejected
/// mutations and no-ops do neither.
///
/// The store is single-threaded. Listeners may call back into the store,
/// including mutating it.
#[derive(Clone)]
pub struct CartStore {
    inner: Rc<StoreInner>,
}

impl CartStore {
    /// Start a session from whatever `persistence` holds.
    ///
    /// The returned worker performs the saves and must be driven for them to
    /// happen; it finishes once every handle to the store is dropped.
    pub async fn hydrate(
        persistence: CartPersistence,
        currency: Currency,
        limits: CartLimits,
    ) -> (Self, PersistenceWorker) {
        let cart = persistence.load_initial(currency, limits).await;
        let (queue, worker) = save_pipeline(persistence);
        (Self::build(cart, Some(queue)), worker)
    }

    /// Start a session that never touches storage.
    pub fn in_memory(cart: Cart) -> Self {
        Self::build(cart, None)
    }

    fn build(cart: Cart, saves: Option<SaveQueue>) -> Self {
        let session_id = SessionId::generate();
        tracing::debug!(
            session = %session_id,
            items = cart.unique_item_count(),
            persistent = saves.is_some(),
            "cart session started"
        );
        Self {
            inner: Rc::new(StoreInner {
                session_id,
                state: RefCell::new(StoreState { cart, revision: 0 }),
                listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
                saves,
            }),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.inner.session_id
    }

    /// Whether saves are currently reaching storage.
    pub fn is_persistent(&self) -> bool {
        self.inner
            .saves
            .as_ref()
            .is_some_and(|queue| queue.is_available())
    }

    /// Add `quantity` units, merging into an existing line with the same key.
    pub fn add_item(
        &self,
        product_id: impl Into<ProductId>,
        variant: impl Into<String>,
        quantity: i64,
        unit_price: i64,
        display_name: impl Into<String>,
    ) -> Result<LineItemKey, CommerceError> {
        let product_id = product_id.into();
        let result = self.mutate(|cart| {
            cart.add_item(product_id.clone(), variant, quantity, unit_price, display_name)
                .map(|key| (key, true))
        });
        if let Err(e) = &result {
            tracing::debug!(
                session = %self.inner.session_id,
                product = %product_id,
                error = %e,
                "add rejected"
            );
        }
        result
    }

    /// Set the quantity of `key`; zero or less removes the line.
    pub fn update_quantity(
        &self,
        key: &LineItemKey,
        quantity: i64,
    ) -> Result<QuantityChange, CommerceError> {
        self.mutate(|cart| {
            let change = cart.update_quantity(key, quantity)?;
            Ok((change, change.is_mutation()))
        })
    }

    /// Remove `key`. Returns `false` when it was not in the cart.
    pub fn remove_item(&self, key: &LineItemKey) -> bool {
        self.mutate(|cart| {
            let removed = cart.remove_item(key);
            Ok((removed, removed))
        })
        .unwrap_or(false)
    }

    /// Empty the cart. Always counts as a mutation.
    pub fn clear(&self) {
        let _ = self.mutate(|cart| {
            cart.clear();
            Ok(((), true))
        });
    }

    /// An owned copy of the current cart.
    pub fn snapshot(&self) -> CartSnapshot {
        let state = self.inner.state.borrow();
        CartSnapshot::capture(&state.cart, state.revision)
    }

    pub fn revision(&self) -> u64 {
        self.inner.state.borrow().revision
    }

    /// Call `listener` after every successful mutation.
    pub fn subscribe(&self, listener: impl Fn(&CartSnapshot) + 'static) -> Subscription {
        let id = self.inner.next_listener.get();
        self.inner.next_listener.set(id + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));
        Subscription {
            id,
            store: Rc::downgrade(&self.inner),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Apply `f` to the cart. `f` returns its result and whether the cart
    /// changed. Listeners run after the borrow is released.
    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut Cart) -> Result<(T, bool), CommerceError>,
    ) -> Result<T, CommerceError> {
        let (value, snapshot) = {
            let mut state = self.inner.state.borrow_mut();
            let (value, changed) = f(&mut state.cart)?;
            if !changed {
                return Ok(value);
            }
            state.revision += 1;
            if let Some(queue) = &self.inner.saves {
                queue.enqueue(&state.cart);
            }
            (value, CartSnapshot::capture(&state.cart, state.revision))
        };

        tracing::debug!(
            session = %self.inner.session_id,
            revision = snapshot.revision,
            items = snapshot.item_count,
            "cart updated"
        );
        self.notify(&snapshot);
        Ok(value)
    }

    fn notify(&self, snapshot: &CartSnapshot) {
        // Listeners may subscribe or unsubscribe while being notified.
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(snapshot);
        }
    }
}

impl fmt::Debug for CartStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("CartStore")
            .field("session_id", &self.inner.session_id)
            .field("revision", &state.revision)
            .field("items", &state.cart.unique_item_count())
            .finish()
    }
}

/// Handle returned by [`CartStore::subscribe`].
///
/// Dropping the handle keeps the listener registered; call
/// [`Subscription::unsubscribe`] to remove it.
#[must_use = "keep the handle to be able to unsubscribe"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    store: Weak<StoreInner>,
}

impl Subscription {
    /// Stop receiving notifications. Returns `false` if the store is gone.
    pub fn unsubscribe(self) -> bool {
        match self.store.upgrade() {
            Some(inner) => {
                inner
                    .listeners
                    .borrow_mut()
                    .retain(|(id, _)| *id != self.id);
                true
            }
            None => false,
        }
    }
}
