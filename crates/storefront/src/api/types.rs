//! Request and response bodies of the storefront REST API.

use bazaar_core::{CartLineItem, Price, PromoCode, UserId};
use serde::{Deserialize, Serialize};

/// Body of `POST /delivery-charges/calculate`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryChargeRequest {
    /// Amount after product discounts and promo codes.
    pub order_amount: Price,
}

/// Response of `POST /delivery-charges/calculate`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryChargeResponse {
    pub delivery_charge: Price,
}

/// Per-line prices sent along with a promo validation, so the server can
/// enforce the same discount exclusivity rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoCartItem {
    pub price: Price,
    pub original_price: Price,
}

impl From<&CartLineItem> for PromoCartItem {
    fn from(item: &CartLineItem) -> Self {
        Self {
            price: item.price,
            original_price: item.original_price,
        }
    }
}

/// Body of `POST /promo-codes/validate`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoValidationRequest {
    pub code: PromoCode,
    pub order_amount: Price,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub cart_items: Vec<PromoCartItem>,
}

/// Response of `POST /promo-codes/validate`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoValidation {
    pub valid: bool,
    #[serde(default)]
    pub discount: Option<Price>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// Generic error body (`{"message": "..."}`) returned by the API.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: String,
}
