//! Checkout dry run.
//!
//! Builds a cart, optionally applies a promo code, quotes delivery through
//! the API and reports the order totals. Nothing is ordered.
//!
//! # Usage
//!
//! ```bash
//! bz-cli quote --catalog products.json --item p-1:250x2 --item p-2 --promo WELCOME10
//! ```

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use bazaar_core::{OrderTotals, Product, ProductId, UserId};
use bazaar_storefront::{ApiClient, SessionContext};
use tracing::{info, warn};

use super::price::find_product;
use super::{api_client, load_fixture};

/// One cart line from the command line: `ID[:WEIGHT][xQTY]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemArg {
    pub product_id: String,
    pub weight: Option<u32>,
    pub qty: u32,
}

impl FromStr for ItemArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let (rest, qty) = match s.rsplit_once('x') {
            Some((rest, qty)) if !qty.is_empty() && qty.bytes().all(|b| b.is_ascii_digit()) => {
                let qty = qty
                    .parse::<u32>()
                    .map_err(|e| format!("invalid quantity in `{s}`: {e}"))?;
                (rest, qty)
            }
            _ => (s, 1),
        };
        if qty == 0 {
            return Err(format!("quantity must be at least 1 in `{s}`"));
        }

        let (product_id, weight) = match rest.split_once(':') {
            Some((id, weight)) => {
                let weight = weight
                    .parse::<u32>()
                    .map_err(|e| format!("invalid weight in `{s}`: {e}"))?;
                (id, Some(weight))
            }
            None => (rest, None),
        };
        if product_id.is_empty() {
            return Err(format!("missing product ID in `{s}`"));
        }

        Ok(Self {
            product_id: product_id.to_string(),
            weight,
            qty,
        })
    }
}

/// Run a checkout dry run against the API.
///
/// A rejected promo code is reported but does not fail the command.
///
/// # Errors
///
/// Returns an error if configuration is missing, a product cannot be found
/// or priced, or the catalog fixture cannot be loaded.
pub async fn run(
    catalog: Option<&Path>,
    items: &[ItemArg],
    promo: Option<&str>,
    user: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = api_client()?;
    let products = resolve_products(&client, catalog, items).await?;

    let mut session = user.map_or_else(SessionContext::new, |id| {
        SessionContext::for_user(UserId::new(id))
    });
    for (item, product) in items.iter().zip(&products) {
        let line = session.add_to_cart(product, item.weight, item.qty)?;
        info!(
            product_id = %line.product_id,
            weight = ?line.selected_weight,
            qty = line.qty,
            price = %line.price,
            original_price = %line.original_price,
            "Cart line"
        );
    }

    let mut checkout = session.checkout(client);
    checkout.refresh_delivery_charge().await;

    if let Some(code) = promo {
        match checkout.apply_promo(code).await {
            Ok(applied) => info!(
                code = %applied.code,
                discount = %applied.discount,
                message = %applied.message,
                "Promo code applied"
            ),
            Err(e) => warn!(code, reason = %e.user_message(), "Promo code not applied"),
        }
    }

    report(&checkout.totals());
    Ok(())
}

/// Products for each item, from the fixture if given, otherwise the API.
async fn resolve_products(
    client: &ApiClient,
    catalog: Option<&Path>,
    items: &[ItemArg],
) -> Result<Vec<Product>, Box<dyn std::error::Error>> {
    if let Some(path) = catalog {
        let catalog: Vec<Product> = load_fixture(path).await?;
        return items
            .iter()
            .map(|item| {
                find_product(&catalog, &item.product_id)
                    .cloned()
                    .map_err(Into::into)
            })
            .collect();
    }

    let mut products = Vec::with_capacity(items.len());
    for item in items {
        let product = client.get_product(&ProductId::new(&item.product_id)).await?;
        products.push(Arc::unwrap_or_clone(product));
    }
    Ok(products)
}

fn report(totals: &OrderTotals) {
    info!(
        subtotal = %totals.subtotal,
        promo_discount = %totals.promo_discount,
        order_amount = %totals.order_amount,
        delivery_charge = %totals.delivery_charge,
        total = %totals.total,
        "Order totals"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_id() {
        let item: ItemArg = "p-1".parse().unwrap();
        assert_eq!(
            item,
            ItemArg {
                product_id: "p-1".to_string(),
                weight: None,
                qty: 1
            }
        );
    }

    #[test]
    fn test_parse_weight_and_qty() {
        let item: ItemArg = "p-1:250x3".parse().unwrap();
        assert_eq!(item.product_id, "p-1");
        assert_eq!(item.weight, Some(250));
        assert_eq!(item.qty, 3);
    }

    #[test]
    fn test_parse_id_containing_x() {
        let item: ItemArg = "box-mix".parse().unwrap();
        assert_eq!(item.product_id, "box-mix");
        assert_eq!(item.qty, 1);

        let item: ItemArg = "box-mixx2".parse().unwrap();
        assert_eq!(item.product_id, "box-mix");
        assert_eq!(item.qty, 2);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!("p-1x0".parse::<ItemArg>().is_err());
        assert!("p-1:heavy".parse::<ItemArg>().is_err());
        assert!(":250".parse::<ItemArg>().is_err());
        assert!("".parse::<ItemArg>().is_err());
    }
}
