//! Catalog records as served by the storefront API.
//!
//! Products may carry a list of weight options (250g, 500g, ... packs), each
//! with its own price, stock and discount terms. A weight option's discount
//! overrides the product's discount; the two never stack.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// How a discount value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `value` is a percentage of the original price.
    Percentage,
    /// `value` is an amount subtracted from the original price.
    Fixed,
    /// Any other type string. Never produces a discount.
    #[serde(other)]
    Unsupported,
}

/// Discount fields shared by products and weight options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountTerms {
    #[serde(default)]
    pub discount_type: Option<DiscountType>,
    #[serde(default)]
    pub discount_value: Option<Decimal>,
    #[serde(default)]
    pub is_discount_active: bool,
}

impl DiscountTerms {
    /// An active discount of the given type and value.
    #[must_use]
    pub const fn active(discount_type: DiscountType, value: Decimal) -> Self {
        Self {
            discount_type: Some(discount_type),
            discount_value: Some(value),
            is_discount_active: true,
        }
    }

    /// The type and value of this discount, if it takes effect.
    ///
    /// The discount is ignored unless it is switched on and both the type and
    /// a non-zero value are present.
    #[must_use]
    pub fn effective(&self) -> Option<(DiscountType, Decimal)> {
        if !self.is_discount_active {
            return None;
        }
        match (self.discount_type, self.discount_value) {
            (Some(kind), Some(value)) if !value.is_zero() => Some((kind, value)),
            _ => None,
        }
    }
}

/// A purchasable pack size of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightOption {
    /// Pack weight in grams, unique within a product.
    pub weight: u32,
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(flatten)]
    pub discount: DiscountTerms,
}

impl WeightOption {
    /// A weight option without a discount.
    #[must_use]
    pub fn new(weight: u32, price: Price, stock: u32) -> Self {
        Self {
            weight,
            price: Some(price),
            stock: Some(stock),
            discount: DiscountTerms::default(),
        }
    }

    /// Attach discount terms to this option.
    #[must_use]
    pub fn with_discount(mut self, discount: DiscountTerms) -> Self {
        self.discount = discount;
        self
    }

    /// Whether this option can serve as the default pricing basis: it has a
    /// positive price and a known stock level.
    #[must_use]
    pub fn is_priceable(&self) -> bool {
        self.stock.is_some() && self.price.is_some_and(|p| p.is_positive())
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "_id")]
    pub id: ProductId,
    #[serde(default)]
    pub name: Option<String>,
    /// Unit price used when no weight option applies.
    #[serde(default)]
    pub price: Option<Price>,
    /// Older records carry `basePrice` instead of `price`.
    #[serde(default)]
    pub base_price: Option<Price>,
    #[serde(default)]
    pub weight_options: Vec<WeightOption>,
    #[serde(flatten)]
    pub discount: DiscountTerms,
}

impl Product {
    /// A product priced by a single unit price, without weight options.
    #[must_use]
    pub fn new(id: impl Into<ProductId>, price: Price) -> Self {
        Self {
            id: id.into(),
            name: None,
            price: Some(price),
            base_price: None,
            weight_options: Vec::new(),
            discount: DiscountTerms::default(),
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replace the weight options.
    #[must_use]
    pub fn with_weight_options(mut self, options: Vec<WeightOption>) -> Self {
        self.weight_options = options;
        self
    }

    /// Attach product-level discount terms.
    #[must_use]
    pub fn with_discount(mut self, discount: DiscountTerms) -> Self {
        self.discount = discount;
        self
    }

    /// Look up a weight option by its weight in grams.
    #[must_use]
    pub fn weight_option(&self, weight: u32) -> Option<&WeightOption> {
        self.weight_options.iter().find(|o| o.weight == weight)
    }

    /// The product-level unit price, preferring `price` over `basePrice`.
    #[must_use]
    pub fn unit_price(&self) -> Option<Price> {
        self.price.or(self.base_price)
    }
}

/// Something that can be priced: a whole product, or one of its weight options.
#[derive(Debug, Clone, Copy)]
pub enum PricedEntity<'a> {
    /// The product without an explicit weight selection.
    Product(&'a Product),
    /// A specific weight option of a product.
    Variant {
        product: &'a Product,
        option: &'a WeightOption,
    },
}

impl<'a> PricedEntity<'a> {
    /// Select a product, optionally narrowed to the option with `weight`.
    ///
    /// Returns `None` when a weight is given but the product has no such option.
    #[must_use]
    pub fn select(product: &'a Product, weight: Option<u32>) -> Option<Self> {
        match weight {
            None => Some(Self::Product(product)),
            Some(w) => product
                .weight_option(w)
                .map(|option| Self::Variant { product, option }),
        }
    }

    /// The product being priced.
    #[must_use]
    pub const fn product(&self) -> &'a Product {
        match self {
            Self::Product(product) | Self::Variant { product, .. } => product,
        }
    }
}
