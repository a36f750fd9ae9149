//! Delivery charge command.
//!
//! # Usage
//!
//! ```bash
//! # Evaluate a rules fixture locally
//! bz-cli delivery --amount 450 --rules delivery-rules.yaml
//!
//! # Ask the API (honours BAZAAR_DELIVERY_MODE)
//! bz-cli delivery --amount 450
//! ```

use std::path::Path;

use bazaar_core::delivery::select_rule;
use bazaar_core::{DeliveryChargeRule, Price, calculate_delivery_charge};
use bazaar_storefront::CheckoutBackend;
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::{api_client, load_fixture};

/// Quote delivery from a rules fixture.
///
/// # Errors
///
/// Returns an error if the fixture cannot be loaded.
pub async fn from_fixture(rules: &Path, amount: Decimal) -> Result<(), Box<dyn std::error::Error>> {
    let rules: Vec<DeliveryChargeRule> = load_fixture(rules).await?;
    let amount = Price::new(amount);

    let (rule, charge) = quote(amount, &rules);
    match rule {
        Some(rule) => info!(
            order_amount = %amount,
            rule = rule.name.as_deref().unwrap_or("unnamed"),
            charge_type = ?rule.charge_type,
            priority = rule.priority,
            delivery_charge = %charge,
            "Delivery charge"
        ),
        None => info!(
            order_amount = %amount,
            delivery_charge = %charge,
            "No delivery rule applies, delivery is free"
        ),
    }
    Ok(())
}

/// Quote delivery through the API.
///
/// A failed quote is reported as free delivery, the same way checkout treats it.
///
/// # Errors
///
/// Returns an error if configuration is missing or invalid.
pub async fn from_api(amount: Decimal) -> Result<(), Box<dyn std::error::Error>> {
    let client = api_client()?;
    let amount = Price::new(amount);

    let charge = match client.delivery_charge(amount).await {
        Ok(charge) => charge,
        Err(e) => {
            warn!(error = %e, "Delivery quote failed, defaulting to free delivery");
            Price::ZERO
        }
    };
    info!(
        order_amount = %amount,
        mode = ?client.delivery_mode(),
        delivery_charge = %charge,
        "Delivery charge"
    );
    Ok(())
}

/// The governing rule, if any, and the charge for `amount`.
pub fn quote(amount: Price, rules: &[DeliveryChargeRule]) -> (Option<&DeliveryChargeRule>, Price) {
    (
        select_rule(amount, rules),
        calculate_delivery_charge(amount, rules),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::{ChargeType, DeliveryTier};

    use super::*;

    fn rupees(n: i64) -> Price {
        Price::from_rupees(n)
    }

    fn rules() -> Vec<DeliveryChargeRule> {
        vec![
            DeliveryChargeRule {
                name: Some("Free over 999".to_string()),
                free_delivery_above: Some(rupees(999)),
                fixed_amount: Some(rupees(60)),
                priority: 2,
                ..DeliveryChargeRule::new(ChargeType::FreeAbove)
            },
            DeliveryChargeRule {
                name: Some("Small orders".to_string()),
                tiers: vec![
                    DeliveryTier {
                        min_amount: rupees(0),
                        max_amount: Some(rupees(499)),
                        charge: rupees(50),
                    },
                    DeliveryTier {
                        min_amount: rupees(500),
                        max_amount: None,
                        charge: rupees(30),
                    },
                ],
                max_order_amount: Some(rupees(700)),
                priority: 1,
                ..DeliveryChargeRule::new(ChargeType::Tiered)
            },
        ]
    }

    #[test]
    fn test_quote_picks_lowest_priority() {
        let rules = rules();
        let (rule, charge) = quote(rupees(300), &rules);
        assert_eq!(rule.unwrap().name.as_deref(), Some("Small orders"));
        assert_eq!(charge, rupees(50));
    }

    #[test]
    fn test_quote_falls_through_window() {
        let rules = rules();
        let (rule, charge) = quote(rupees(1200), &rules);
        assert_eq!(rule.unwrap().name.as_deref(), Some("Free over 999"));
        assert_eq!(charge, Price::ZERO);
    }

    #[test]
    fn test_quote_without_rules() {
        let (rule, charge) = quote(rupees(300), &[]);
        assert!(rule.is_none());
        assert_eq!(charge, Price::ZERO);
    }
}
