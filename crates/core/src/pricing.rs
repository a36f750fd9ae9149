//! Discount resolution.
//!
//! Given a product, and optionally one of its weight options, work out the
//! unit price a customer pays.
//!
//! # Rules
//!
//! 1. Base price: the selected weight option's price; otherwise the first
//!    priceable weight option in list order (see [`best_weight_option`]);
//!    otherwise the product's `price`, then `basePrice`.
//! 2. Discount: the weight option's active discount if it has one, else the
//!    product's active discount, else none. Discounts never stack.
//! 3. No positive base price means the product cannot be priced at all;
//!    [`resolve_price`] returns `None` and callers must refuse to sell it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{DiscountType, PricedEntity, Product, WeightOption};
use crate::types::Price;

/// Supported discount kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    Percentage,
    Fixed,
}

impl DiscountKind {
    const fn from_type(discount_type: DiscountType) -> Option<Self> {
        match discount_type {
            DiscountType::Percentage => Some(Self::Percentage),
            DiscountType::Fixed => Some(Self::Fixed),
            DiscountType::Unsupported => None,
        }
    }
}

/// The discount descriptor that produced a discounted price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    #[serde(rename = "type")]
    pub kind: DiscountKind,
    pub value: Decimal,
}

/// The outcome of pricing a product or weight option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceInfo {
    /// Undiscounted unit price.
    pub original: Price,
    /// Unit price after discount; equals `original` when no discount applies.
    pub discounted: Price,
    pub has_discount: bool,
    pub discount_info: Option<Discount>,
}

impl PriceInfo {
    /// A price without any discount.
    #[must_use]
    pub const fn undiscounted(original: Price) -> Self {
        Self {
            original,
            discounted: original,
            has_discount: false,
            discount_info: None,
        }
    }

    /// Amount saved per unit.
    #[must_use]
    pub fn savings(&self) -> Price {
        self.original.saturating_sub(self.discounted)
    }
}

/// Apply a discount to a price.
///
/// Percentage values are not clamped: a value outside `0..=100` yields a price
/// above the original or below zero. Fixed discounts floor at zero.
#[must_use]
pub fn calculate_discounted_price(original: Price, kind: DiscountKind, value: Decimal) -> Price {
    match kind {
        DiscountKind::Percentage => Price::new(original.amount() - original.percent(value).amount()),
        DiscountKind::Fixed => original.saturating_sub(Price::new(value)),
    }
}

/// The default weight option when the customer has not picked one: the first
/// option in list order with a positive price and a known stock level.
#[must_use]
pub fn best_weight_option(options: &[WeightOption]) -> Option<&WeightOption> {
    options.iter().find(|o| o.is_priceable())
}

/// Resolve the price of a product or one of its weight options.
///
/// Returns `None` if there is no positive base price to work from.
#[must_use]
pub fn resolve_price(entity: PricedEntity<'_>) -> Option<PriceInfo> {
    let product = entity.product();
    let option = match entity {
        PricedEntity::Variant { option, .. } => Some(option),
        PricedEntity::Product(product) => best_weight_option(&product.weight_options),
    };

    let base = match option {
        Some(option) => option.price,
        None => product.unit_price(),
    };
    let original = base.filter(Price::is_positive)?;

    let terms = option
        .and_then(|o| o.discount.effective())
        .or_else(|| product.discount.effective());

    let Some(discount) = terms.and_then(|(discount_type, value)| {
        DiscountKind::from_type(discount_type).map(|kind| Discount { kind, value })
    }) else {
        return Some(PriceInfo::undiscounted(original));
    };

    Some(PriceInfo {
        original,
        discounted: calculate_discounted_price(original, discount.kind, discount.value),
        has_discount: true,
        discount_info: Some(discount),
    })
}

impl Product {
    /// Price this product, optionally narrowed to the weight option of
    /// `weight` grams. An unknown weight cannot be priced.
    #[must_use]
    pub fn price_info(&self, weight: Option<u32>) -> Option<PriceInfo> {
        PricedEntity::select(self, weight).and_then(resolve_price)
    }
}
