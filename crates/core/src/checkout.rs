//! Checkout arithmetic and the promo-code gate.
//!
//! ```text
//! subtotal       = Σ line.price × line.qty
//! order_amount   = subtotal − promo_discount   (never below zero)
//! delivery       = delivery rules applied to order_amount
//! total          = order_amount + delivery
//! ```
//!
//! Promo codes are mutually exclusive with product-level discounts: if any
//! line was added at a discounted price, no promo code may be applied.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::CartLineItem;
use crate::types::Price;

/// Sum of `price × qty` over all lines.
#[must_use]
pub fn subtotal(items: &[CartLineItem]) -> Price {
    items.iter().map(CartLineItem::line_total).sum()
}

/// Whether any line carries a product or weight discount.
#[must_use]
pub fn carries_product_discount(items: &[CartLineItem]) -> bool {
    items.iter().any(CartLineItem::is_discounted)
}

/// A promo code was attempted on a cart that already has discounted items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error(
    "Promo codes cannot be combined with discounted products. Remove the discounted items from your cart to use a promo code."
)]
pub struct PromoIneligible;

/// Refuse promo codes for carts containing discounted items.
///
/// # Errors
///
/// Returns [`PromoIneligible`] if any line has `original_price > price`.
pub fn ensure_promo_eligible(items: &[CartLineItem]) -> Result<(), PromoIneligible> {
    if carries_product_discount(items) {
        Err(PromoIneligible)
    } else {
        Ok(())
    }
}

/// The money breakdown shown at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub subtotal: Price,
    pub promo_discount: Price,
    /// Subtotal after the promo discount. Delivery is quoted on this amount.
    pub order_amount: Price,
    pub delivery_charge: Price,
    pub total: Price,
}

impl OrderTotals {
    #[must_use]
    pub fn new(subtotal: Price, promo_discount: Price, delivery_charge: Price) -> Self {
        let order_amount = subtotal.saturating_sub(promo_discount);
        let delivery_charge = delivery_charge.non_negative();
        Self {
            subtotal,
            promo_discount,
            order_amount,
            delivery_charge,
            total: order_amount + delivery_charge,
        }
    }
}
