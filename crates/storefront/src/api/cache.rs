//! Cache types for API responses.

use std::sync::Arc;

use bazaar_core::{DeliveryChargeRule, Product, ProductId};

/// Cache key for catalog and delivery-rule lookups.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    ActiveDeliveryRules,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Arc<Product>),
    DeliveryRules(Arc<[DeliveryChargeRule]>),
}
