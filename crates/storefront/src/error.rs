//! Checkout error handling.
//!
//! Every checkout failure has a safe fallback: an unpriceable product is
//! never added, a failed delivery quote becomes free delivery, and a failed
//! promo leaves the discount at zero. Only the promo and cart paths reach the
//! customer as errors; the delivery path is logged and absorbed.

use bazaar_core::{CartError, PromoCodeError, PromoIneligible};
use thiserror::Error;

/// Message shown when the promo service is unavailable or gives no reason.
pub const PROMO_FALLBACK_MESSAGE: &str = "Failed to apply promo code. Please try again.";

/// Checkout errors surfaced to the customer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// The promo code input was empty or malformed.
    #[error("Invalid promo code: {0}")]
    InvalidPromoCode(#[from] PromoCodeError),

    /// The cart holds discounted items, so promo codes are refused.
    #[error("Promo code refused: {0}")]
    PromoIneligible(#[from] PromoIneligible),

    /// The API rejected the code, or could not be reached.
    #[error("Promo code rejected: {0}")]
    PromoRejected(String),

    /// A cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),
}

impl CheckoutError {
    /// The message to show the customer.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidPromoCode(err) => capitalize(&err.to_string()),
            Self::PromoIneligible(err) => err.to_string(),
            Self::PromoRejected(message) if message.trim().is_empty() => {
                PROMO_FALLBACK_MESSAGE.to_string()
            }
            Self::PromoRejected(message) => message.clone(),
            Self::Cart(CartError::Unpriceable(_)) => {
                "This product is currently unavailable and cannot be added to your cart."
                    .to_string()
            }
            Self::Cart(err) => capitalize(&err.to_string()),
        }
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Result type alias for `CheckoutError`.
pub type Result<T> = std::result::Result<T, CheckoutError>;
