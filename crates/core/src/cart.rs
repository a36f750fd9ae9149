//! Cart line items.
//!
//! A line item captures the unit price at the moment it was added to the
//! cart. Later catalog changes do not reprice existing lines.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Product;
use crate::types::{Price, ProductId};

/// Errors from cart operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The product (or the chosen weight) has no usable price.
    #[error("product {0} cannot be added to the cart: no price available")]
    Unpriceable(ProductId),

    /// Quantities must be at least one when adding.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// No line matches the product and weight.
    #[error("product {0} is not in the cart")]
    LineNotFound(ProductId),
}

/// One product (and pack size) in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub product_id: ProductId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub selected_weight: Option<u32>,
    pub qty: u32,
    /// Unit price paid, after any product or weight discount.
    pub price: Price,
    /// Unit price before discount.
    pub original_price: Price,
}

impl CartLineItem {
    /// `price × qty`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.qty)
    }

    /// Whether this line was added with a product or weight discount.
    #[must_use]
    pub fn is_discounted(&self) -> bool {
        self.original_price > self.price
    }

    fn matches(&self, product_id: &ProductId, weight: Option<u32>) -> bool {
        &self.product_id == product_id && self.selected_weight == weight
    }
}

/// A customer's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartLineItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Add `qty` units of `product` (optionally a specific pack weight).
    ///
    /// If the same product and weight is already in the cart its quantity is
    /// increased and its price snapshot is kept.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] for a zero quantity and
    /// [`CartError::Unpriceable`] if the product cannot be priced.
    pub fn add(
        &mut self,
        product: &Product,
        weight: Option<u32>,
        qty: u32,
    ) -> Result<&CartLineItem, CartError> {
        if qty == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let info = product
            .price_info(weight)
            .ok_or_else(|| CartError::Unpriceable(product.id.clone()))?;

        let index = if let Some(index) = self
            .items
            .iter()
            .position(|item| item.matches(&product.id, weight))
        {
            index
        } else {
            self.items.push(CartLineItem {
                product_id: product.id.clone(),
                name: product.name.clone(),
                selected_weight: weight,
                qty: 0,
                price: info.discounted,
                original_price: info.original,
            });
            self.items.len() - 1
        };

        let item = self
            .items
            .get_mut(index)
            .ok_or_else(|| CartError::LineNotFound(product.id.clone()))?;
        item.qty = item.qty.saturating_add(qty);
        Ok(item)
    }

    /// Set the quantity of a line. A quantity of zero removes it.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if no line matches.
    pub fn update_quantity(
        &mut self,
        product_id: &ProductId,
        weight: Option<u32>,
        qty: u32,
    ) -> Result<(), CartError> {
        if qty == 0 {
            return self.remove(product_id, weight).map(|_| ());
        }

        let item = self
            .items
            .iter_mut()
            .find(|item| item.matches(product_id, weight))
            .ok_or_else(|| CartError::LineNotFound(product_id.clone()))?;
        item.qty = qty;
        Ok(())
    }

    /// Remove a line and return it.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] if no line matches.
    pub fn remove(
        &mut self,
        product_id: &ProductId,
        weight: Option<u32>,
    ) -> Result<CartLineItem, CartError> {
        let index = self
            .items
            .iter()
            .position(|item| item.matches(product_id, weight))
            .ok_or_else(|| CartError::LineNotFound(product_id.clone()))?;
        Ok(self.items.remove(index))
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |count, item| count.saturating_add(item.qty))
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        crate::checkout::subtotal(&self.items)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::catalog::{DiscountTerms, DiscountType, WeightOption};

    fn rupees(n: i64) -> Price {
        Price::from_rupees(n)
    }

    fn turmeric() -> Product {
        Product::new("turmeric", rupees(150))
            .with_name("Turmeric")
            .with_weight_options(vec![
                WeightOption::new(250, rupees(120), 8).with_discount(DiscountTerms::active(
                    DiscountType::Fixed,
                    dec!(20),
                )),
                WeightOption::new(500, rupees(220), 4),
            ])
    }

    #[test]
    fn test_add_captures_price_snapshot() {
        let mut cart = Cart::new();
        let item = cart.add(&turmeric(), Some(250), 2).unwrap().clone();

        assert_eq!(item.price, rupees(100));
        assert_eq!(item.original_price, rupees(120));
        assert_eq!(item.name.as_deref(), Some("Turmeric"));
        assert!(item.is_discounted());
        assert_eq!(cart.subtotal(), rupees(200));
    }

    #[test]
    fn test_add_same_line_merges_and_keeps_snapshot() {
        let mut cart = Cart::new();
        let mut product = turmeric();
        cart.add(&product, Some(500), 1).unwrap();

        product.weight_options[1].price = Some(rupees(300));
        let item = cart.add(&product, Some(500), 2).unwrap();
        assert_eq!(item.qty, 3);
        assert_eq!(item.price, rupees(220));

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_different_weights_are_separate_lines() {
        let mut cart = Cart::new();
        cart.add(&turmeric(), Some(250), 1).unwrap();
        cart.add(&turmeric(), Some(500), 1).unwrap();
        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.subtotal(), rupees(320));
    }

    #[test]
    fn test_unpriceable_product_is_rejected() {
        let mut cart = Cart::new();
        let mut product = Product::new("mystery", Price::ZERO);
        product.price = None;

        let err = cart.add(&product, None, 1).unwrap_err();
        assert_eq!(err, CartError::Unpriceable(ProductId::new("mystery")));
        assert!(cart.is_empty());

        let err = cart.add(&turmeric(), Some(1000), 1).unwrap_err();
        assert!(matches!(err, CartError::Unpriceable(_)));
    }

    #[test]
    fn test_zero_quantity_is_rejected() {
        let mut cart = Cart::new();
        assert_eq!(
            cart.add(&turmeric(), None, 0).unwrap_err(),
            CartError::InvalidQuantity
        );
    }

    #[test]
    fn test_update_and_remove() {
        let mut cart = Cart::new();
        let id = ProductId::new("turmeric");
        cart.add(&turmeric(), Some(500), 1).unwrap();

        cart.update_quantity(&id, Some(500), 5).unwrap();
        assert_eq!(cart.item_count(), 5);

        assert_eq!(
            cart.update_quantity(&id, Some(250), 1).unwrap_err(),
            CartError::LineNotFound(id.clone())
        );

        cart.update_quantity(&id, Some(500), 0).unwrap();
        assert!(cart.is_empty());

        cart.add(&turmeric(), None, 1).unwrap();
        let removed = cart.remove(&id, None).unwrap();
        assert_eq!(removed.price, rupees(100));
        assert!(cart.remove(&id, None).is_err());
    }

    #[test]
    fn test_item_count_saturates() {
        let mut cart = Cart::new();
        cart.add(&turmeric(), Some(250), u32::MAX).unwrap();
        cart.add(&turmeric(), Some(500), 2).unwrap();
        assert_eq!(cart.item_count(), u32::MAX);

        cart.remove(&ProductId::new("turmeric"), Some(250)).unwrap();
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add(&turmeric(), Some(250), 1).unwrap();
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal(), Price::ZERO);
    }
}
