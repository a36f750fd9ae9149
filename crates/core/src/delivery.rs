//! Delivery-charge rule selection.
//!
//! Delivery charge rules are configured in the back office and served by the
//! API. For a given order amount:
//!
//! 1. Keep the active rules whose `[minOrderAmount, maxOrderAmount]` window
//!    contains the amount (an absent maximum is unbounded).
//! 2. Pick the one with the lowest `priority`; equal priorities keep list order.
//! 3. Apply its charge type. No matching rule means free delivery.
//!
//! The result is never negative.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Price;

/// How a rule turns an order amount into a delivery fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeType {
    /// Flat `fixedAmount`.
    Fixed,
    /// `percentage` percent of the order amount.
    Percentage,
    /// Free at or above `freeDeliveryAbove`; `fixedAmount` (or nothing) below.
    FreeAbove,
    /// Charge of the tier containing the order amount.
    Tiered,
}

/// One band of a tiered rule. Covers `[min_amount, max_amount)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryTier {
    pub min_amount: Price,
    #[serde(default)]
    pub max_amount: Option<Price>,
    pub charge: Price,
}

impl DeliveryTier {
    /// Whether `amount` falls inside this tier.
    #[must_use]
    pub fn contains(&self, amount: Price) -> bool {
        amount >= self.min_amount && self.max_amount.is_none_or(|max| amount < max)
    }
}

/// A delivery charge rule as served by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryChargeRule {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub charge_type: ChargeType,
    #[serde(default)]
    pub fixed_amount: Option<Price>,
    #[serde(default)]
    pub percentage: Option<Decimal>,
    #[serde(default)]
    pub free_delivery_above: Option<Price>,
    #[serde(default)]
    pub tiers: Vec<DeliveryTier>,
    #[serde(default)]
    pub min_order_amount: Price,
    #[serde(default)]
    pub max_order_amount: Option<Price>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub is_active: bool,
}

impl DeliveryChargeRule {
    /// An active rule of `charge_type` with priority 0 and an unbounded
    /// applicability window. Use struct update syntax to fill in the rest.
    #[must_use]
    pub const fn new(charge_type: ChargeType) -> Self {
        Self {
            id: None,
            name: None,
            charge_type,
            fixed_amount: None,
            percentage: None,
            free_delivery_above: None,
            tiers: Vec::new(),
            min_order_amount: Price::ZERO,
            max_order_amount: None,
            priority: 0,
            is_active: true,
        }
    }

    /// Whether this rule is eligible for an order of `amount`.
    #[must_use]
    pub fn applies_to(&self, amount: Price) -> bool {
        self.is_active
            && amount >= self.min_order_amount
            && self.max_order_amount.is_none_or(|max| amount <= max)
    }

    /// The delivery fee this rule charges for an order of `amount`.
    ///
    /// Does not check applicability; see [`Self::applies_to`].
    #[must_use]
    pub fn charge_for(&self, amount: Price) -> Price {
        let charge = match self.charge_type {
            ChargeType::Fixed => self.fixed_amount.unwrap_or_default(),
            ChargeType::Percentage => self
                .percentage
                .map_or(Price::ZERO, |pct| amount.percent(pct)),
            ChargeType::FreeAbove => match self.free_delivery_above {
                Some(threshold) if amount >= threshold => Price::ZERO,
                _ => self.fixed_amount.unwrap_or_default(),
            },
            ChargeType::Tiered => self
                .tiers
                .iter()
                .find(|tier| tier.contains(amount))
                .map_or(Price::ZERO, |tier| tier.charge),
        };
        charge.non_negative()
    }
}

/// The rule that governs an order of `amount`, if any.
#[must_use]
pub fn select_rule(amount: Price, rules: &[DeliveryChargeRule]) -> Option<&DeliveryChargeRule> {
    rules
        .iter()
        .filter(|rule| rule.applies_to(amount))
        .min_by_key(|rule| rule.priority)
}

/// Delivery fee for an order of `amount` under `rules`. Zero when no rule applies.
#[must_use]
pub fn calculate_delivery_charge(amount: Price, rules: &[DeliveryChargeRule]) -> Price {
    select_rule(amount, rules).map_or(Price::ZERO, |rule| rule.charge_for(amount))
}
