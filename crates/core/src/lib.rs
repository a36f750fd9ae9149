//! Bazaar Core - pricing and delivery rules for the storefront.
//!
//! This crate provides the types and decision procedures shared by every
//! Bazaar component:
//! - `storefront` - API client and checkout orchestration
//! - `cli` - Command-line tools for inspecting prices and delivery quotes
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no async. Every computation here is synchronous and deterministic.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices and promo codes
//! - [`catalog`] - Products, weight options and their discount terms
//! - [`pricing`] - Discount resolution for a product or weight option
//! - [`delivery`] - Delivery-charge rule selection
//! - [`cart`] - Cart line items with price snapshots
//! - [`checkout`] - Subtotal, promo gate and order totals

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod delivery;
pub mod pricing;
pub mod types;

pub use cart::{Cart, CartError, CartLineItem};
pub use catalog::{DiscountTerms, DiscountType, PricedEntity, Product, WeightOption};
pub use checkout::{OrderTotals, PromoIneligible};
pub use delivery::{ChargeType, DeliveryChargeRule, DeliveryTier, calculate_delivery_charge};
pub use pricing::{Discount, DiscountKind, PriceInfo, resolve_price};
pub use types::*;
