//! Price lookup command.
//!
//! # Usage
//!
//! ```bash
//! # From a catalog fixture
//! bz-cli price --catalog products.json --product p-1 --weight 250
//!
//! # From the API (requires BAZAAR_API_BASE_URL)
//! bz-cli price --remote --product p-1
//! ```

use std::path::Path;

use bazaar_core::{PriceInfo, Product, ProductId};
use thiserror::Error;
use tracing::info;

use super::{api_client, load_fixture};

/// Errors that can occur while pricing a product.
#[derive(Debug, Error)]
pub enum PriceError {
    #[error("Product not found in catalog: {0}")]
    UnknownProduct(String),

    #[error("Product {product} has no {weight}g weight option")]
    UnknownWeight { product: String, weight: u32 },

    #[error("Product {0} has no usable price")]
    Unpriceable(String),
}

/// Price a product from a catalog fixture.
///
/// # Errors
///
/// Returns an error if the fixture cannot be loaded or the product cannot be
/// priced.
pub async fn from_fixture(
    catalog: &Path,
    product_id: &str,
    weight: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let products: Vec<Product> = load_fixture(catalog).await?;
    info!(count = products.len(), path = %catalog.display(), "Loaded catalog");

    let product = find_product(&products, product_id)?;
    let price = price_product(product, weight)?;
    report(product, weight, &price);
    Ok(())
}

/// Price a product fetched from the API.
///
/// # Errors
///
/// Returns an error if configuration is missing, the request fails, or the
/// product cannot be priced.
pub async fn from_api(
    product_id: &str,
    weight: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = api_client()?;
    let product = client.get_product(&ProductId::new(product_id)).await?;
    let price = price_product(&product, weight)?;
    report(&product, weight, &price);
    Ok(())
}

/// Find a product by ID in a loaded catalog.
pub fn find_product<'a>(products: &'a [Product], id: &str) -> Result<&'a Product, PriceError> {
    products
        .iter()
        .find(|p| p.id.as_str() == id)
        .ok_or_else(|| PriceError::UnknownProduct(id.to_string()))
}

/// Resolve the price of a product, or one of its weight options.
pub fn price_product(product: &Product, weight: Option<u32>) -> Result<PriceInfo, PriceError> {
    if let Some(weight) = weight
        && product.weight_option(weight).is_none()
    {
        return Err(PriceError::UnknownWeight {
            product: product.id.to_string(),
            weight,
        });
    }

    product
        .price_info(weight)
        .ok_or_else(|| PriceError::Unpriceable(product.id.to_string()))
}

fn report(product: &Product, weight: Option<u32>, price: &PriceInfo) {
    let name = product.name.as_deref().unwrap_or(product.id.as_str());
    let weight = weight.map_or_else(|| "default".to_string(), |w| format!("{w}g"));

    if let Some(discount) = price.discount_info {
        info!(
            product = name,
            weight = %weight,
            original = %price.original,
            discounted = %price.discounted,
            savings = %price.savings(),
            discount_type = ?discount.kind,
            discount_value = %discount.value,
            "Discounted price"
        );
    } else {
        info!(product = name, weight = %weight, price = %price.original, "Price");
    }
}
