//! Per-customer session context.
//!
//! Holds who the customer is and what is in their cart. Guests get a random
//! session identifier the first time one is needed; it stays stable for the
//! life of the context.

use bazaar_core::{Cart, CartLineItem, Product, SessionId, UserId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::checkout::{CheckoutBackend, CheckoutSession};
use crate::error::Result;

/// A customer's session: identity plus cart.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    #[serde(default)]
    user_id: Option<UserId>,
    #[serde(default)]
    guest_id: Option<SessionId>,
    #[serde(default)]
    cart: Cart,
}

impl SessionContext {
    /// An anonymous session with an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A session for a signed-in customer.
    #[must_use]
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    /// Attach a signed-in customer. The cart is kept.
    pub fn sign_in(&mut self, user_id: UserId) {
        info!(user_id = %user_id, "Customer signed in");
        self.user_id = Some(user_id);
    }

    /// Forget the signed-in customer. The cart and guest ID are kept.
    pub fn sign_out(&mut self) {
        self.user_id = None;
    }

    /// The guest session identifier, created on first use.
    pub fn guest_id(&mut self) -> &SessionId {
        self.guest_id.get_or_insert_with(|| {
            let id = SessionId::new(uuid::Uuid::new_v4().to_string());
            debug!(guest_id = %id, "Created guest session");
            id
        })
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Add a product to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the product cannot be priced or `qty` is zero.
    pub fn add_to_cart(
        &mut self,
        product: &Product,
        weight: Option<u32>,
        qty: u32,
    ) -> Result<&CartLineItem> {
        let item = self.cart.add(product, weight, qty)?;
        debug!(
            product_id = %item.product_id,
            weight = ?item.selected_weight,
            qty = item.qty,
            price = %item.price,
            "Added to cart"
        );
        Ok(item)
    }

    /// Mutable access to the cart for quantity updates and removals.
    pub const fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    /// Start checkout for the current cart.
    pub fn checkout<B: CheckoutBackend>(&self, backend: B) -> CheckoutSession<B> {
        CheckoutSession::new(backend, self.cart.items().to_vec(), self.user_id.clone())
    }

    /// Empty the cart once an order has been placed.
    pub fn complete_checkout(&mut self) {
        info!(items = self.cart.items().len(), "Checkout completed, clearing cart");
        self.cart.clear();
    }
}
