//! Core types for Bazaar.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod promo;

pub use id::*;
pub use price::Price;
pub use promo::{PromoCode, PromoCodeError};
