//! Checkout submission state machine.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use chrono::Utc;

use crate::cart::CartStore;
use crate::checkout::{ContactInfo, Order, OrderApi, OrderApiError, OrderRequest};
use crate::error::{CheckoutError, ValidationErrors};
use crate::ids::{IdempotencyKey, OrderId};

/// Where a checkout is in its submission lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CheckoutState {
    /// Nothing submitted yet.
    #[default]
    Idle,
    /// Checking the cart and contact details.
    Validating,
    /// Waiting for the order API.
    Submitting,
    /// The order was placed.
    Succeeded(OrderId),
    /// The last attempt failed; `submit` may be called again.
    Failed(OrderApiError),
}

impl CheckoutState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutState::Idle => "idle",
            CheckoutState::Validating => "validating",
            CheckoutState::Submitting => "submitting",
            CheckoutState::Succeeded(_) => "succeeded",
            CheckoutState::Failed(_) => "failed",
        }
    }

    /// A submission is under way.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, CheckoutState::Validating | CheckoutState::Submitting)
    }

    /// `submit` is accepted in this state.
    pub fn can_submit(&self) -> bool {
        matches!(self, CheckoutState::Idle | CheckoutState::Failed(_))
    }
}

impl fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Inner {
    cart: CartStore,
    api: Arc<dyn OrderApi>,
    state: RefCell<CheckoutState>,
    order: RefCell<Option<Order>>,
    attempt: RefCell<Option<IdempotencyKey>>,
    alive: Cell<bool>,
}

/// Drives one checkout from the contact form to a placed order.
///
/// `Idle -> Validating -> Submitting -> Succeeded | Failed`, with
/// `Failed -> Validating` on retry. While a submission is in flight further
/// calls to [`submit`](Self::submit) are refused without touching the
/// network. Every retry reuses the key minted for the first attempt until an
/// order is placed, even if the cart changed in between.
///
/// Call [`teardown`](Self::teardown) when the owning view goes away; a
/// response arriving after that is dropped.
#[derive(Clone)]
pub struct CheckoutOrchestrator {
    inner: Rc<Inner>,
}

impl CheckoutOrchestrator {
    pub fn new(cart: CartStore, api: Arc<dyn OrderApi>) -> Self {
        Self {
            inner: Rc::new(Inner {
                cart,
                api,
                state: RefCell::new(CheckoutState::Idle),
                order: RefCell::new(None),
                attempt: RefCell::new(None),
                alive: Cell::new(true),
            }),
        }
    }

    /// Validate, then place the order.
    ///
    /// On success the cart is cleared and the placed order returned.
    pub async fn submit(&self, contact: ContactInfo) -> Result<Order, CheckoutError> {
        let session = self.inner.cart.session_id().clone();

        if !self.is_alive() {
            return Err(CheckoutError::Discarded);
        }
        let previous = self.state();
        if previous.is_in_progress() {
            tracing::warn!(session = %session, state = %previous, "duplicate checkout submission refused");
            return Err(CheckoutError::AlreadySubmitting);
        }
        if matches!(previous, CheckoutState::Succeeded(_)) {
            return Err(CheckoutError::AlreadyCompleted);
        }

        self.set_state(CheckoutState::Validating);
        let contact = contact.normalized();
        let snapshot = self.inner.cart.snapshot();

        let mut errors = ValidationErrors::new();
        if snapshot.is_empty() {
            errors.push("cart", "cart is empty");
        }
        if let Err(contact_errors) = contact.validate() {
            errors.extend(contact_errors);
        }
        if let Err(errors) = errors.into_result() {
            tracing::debug!(session = %session, errors = %errors, "checkout validation failed");
            self.set_state(previous);
            return Err(CheckoutError::Validation(errors));
        }

        let idempotency_key = self.attempt_key();
        self.set_state(CheckoutState::Submitting);
        tracing::info!(
            session = %session,
            idempotency_key = %idempotency_key,
            items = snapshot.item_count,
            subtotal = %snapshot.subtotal,
            "submitting order"
        );

        let request = OrderRequest::new(&snapshot, contact.clone(), idempotency_key.clone());
        let result = self.inner.api.submit_order(&request).await;

        if !self.is_alive() {
            tracing::warn!(
                session = %session,
                idempotency_key = %idempotency_key,
                "checkout torn down, discarding order response"
            );
            return Err(CheckoutError::Discarded);
        }

        match result {
            Ok(confirmation) => {
                let order = Order {
                    id: confirmation.order_id,
                    cart: snapshot,
                    contact,
                    idempotency_key,
                    status: confirmation.status,
                    placed_at: Utc::now(),
                };
                tracing::info!(session = %session, order_id = %order.id, "order placed");

                *self.inner.order.borrow_mut() = Some(order.clone());
                self.inner.attempt.borrow_mut().take();
                self.set_state(CheckoutState::Succeeded(order.id.clone()));
                self.inner.cart.clear();
                Ok(order)
            }
            Err(error) => {
                tracing::warn!(
                    session = %session,
                    idempotency_key = %idempotency_key,
                    error_code = %error.error_code,
                    retryable = error.retryable,
                    "order submission failed"
                );
                self.set_state(CheckoutState::Failed(error.clone()));
                Err(CheckoutError::Rejected(error))
            }
        }
    }

    /// The pending attempt's key, minted on first use.
    fn attempt_key(&self) -> IdempotencyKey {
        self.inner
            .attempt
            .borrow_mut()
            .get_or_insert_with(IdempotencyKey::generate)
            .clone()
    }

    fn set_state(&self, state: CheckoutState) {
        *self.inner.state.borrow_mut() = state;
    }

    pub fn state(&self) -> CheckoutState {
        self.inner.state.borrow().clone()
    }

    /// The placed order, once the checkout has succeeded.
    pub fn order(&self) -> Option<Order> {
        self.inner.order.borrow().clone()
    }

    /// Why the last attempt failed, while in `Failed`.
    pub fn failure(&self) -> Option<OrderApiError> {
        match &*self.inner.state.borrow() {
            CheckoutState::Failed(error) => Some(error.clone()),
            _ => None,
        }
    }

    /// Key the next retry would reuse, if any.
    pub fn idempotency_key(&self) -> Option<IdempotencyKey> {
        self.inner
            .attempt
            .borrow()
            .clone()
    }

    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// Detach from the view. Late responses are dropped from now on.
    pub fn teardown(&self) {
        if self.inner.alive.replace(false) {
            tracing::debug!(
                session = %self.inner.cart.session_id(),
                state = %self.state(),
                "checkout torn down"
            );
        }
    }

    pub fn is_alive(&self) -> bool {
        self.inner.alive.get()
    }
}

impl fmt::Debug for CheckoutOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckoutOrchestrator")
            .field("state", &self.state())
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::Cart;
    use crate::checkout::OrderConfirmation;
    use crate::money::Currency;
    use async_trait::async_trait;

    struct AcceptAll;

    #[async_trait]
    impl OrderApi for AcceptAll {
        async fn submit_order(
            &self,
            request: &OrderRequest,
        ) -> Result<OrderConfirmation, OrderApiError> {
            Ok(OrderConfirmation::new(format!(
                "ord_{}",
                request.idempotency_key
            )))
        }
    }

    fn orchestrator() -> CheckoutOrchestrator {
        let cart = CartStore::in_memory(Cart::new(Currency::USD));
        CheckoutOrchestrator::new(cart, Arc::new(AcceptAll))
    }

    #[test]
    fn test_state_helpers() {
        assert!(CheckoutState::Idle.can_submit());
        assert!(CheckoutState::Failed(OrderApiError::network("down")).can_submit());
        assert!(CheckoutState::Submitting.is_in_progress());
        assert!(!CheckoutState::Succeeded(OrderId::new("ord_1")).can_submit());
        assert_eq!(CheckoutState::Validating.to_string(), "validating");
    }

    #[test]
    fn test_attempt_key_is_stable() {
        let checkout = orchestrator();
        assert_eq!(checkout.idempotency_key(), None);
        let first = checkout.attempt_key();
        assert_eq!(checkout.attempt_key(), first);
        checkout.cart().add_item("tshirt", "M", 1, 1500, "Tee").unwrap();
        assert_eq!(checkout.attempt_key(), first);
        assert_eq!(checkout.idempotency_key(), Some(first));
    }

    #[tokio::test]
    async fn test_submit_places_order() {
        let checkout = orchestrator();
        checkout
            .cart()
            .add_item("tshirt", "M", 2, 1500, "Tee")
            .unwrap();

        let order = checkout
            .submit(ContactInfo::new("Ada", "ada@example.org"))
            .await
            .unwrap();

        assert_eq!(checkout.state(), CheckoutState::Succeeded(order.id.clone()));
        assert_eq!(order.subtotal().amount_minor, 3000);
        assert!(order.id.as_str().starts_with("ord_idem_"));
        assert!(checkout.cart().snapshot().is_empty());
        assert_eq!(checkout.idempotency_key(), None);
    }

    #[tokio::test]
    async fn test_submit_after_teardown() {
        let checkout = orchestrator();
        checkout.teardown();
        let result = checkout
            .submit(ContactInfo::new("Ada", "ada@example.org"))
            .await;
        assert!(matches!(result, Err(CheckoutError::Discarded)));
        assert_eq!(checkout.state(), CheckoutState::Idle);
    }
}
