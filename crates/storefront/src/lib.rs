//! Bazaar Storefront library.
//!
//! The I/O half of storefront pricing: the REST API client, the customer
//! session context, and checkout orchestration on top of the pure rules in
//! `bazaar_core`.
//!
//! # Example
//!
//! ```rust,ignore
//! use bazaar_storefront::{ApiClient, SessionContext, StorefrontConfig};
//!
//! let config = StorefrontConfig::from_env()?;
//! let client = ApiClient::new(&config.api)?;
//!
//! let mut session = SessionContext::new();
//! let product = client.get_product(&"p-1".into()).await?;
//! session.add_to_cart(&product, Some(250), 2)?;
//!
//! let mut checkout = session.checkout(client.clone());
//! checkout.refresh_delivery_charge().await;
//! checkout.apply_promo("WELCOME10").await?;
//! let totals = checkout.totals();
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod checkout;
pub mod config;
pub mod error;
pub mod session;

pub use api::{ApiClient, ApiError};
pub use checkout::{AppliedPromo, CheckoutBackend, CheckoutSession, DeliveryQuoteTicket};
pub use config::{ApiConfig, ConfigError, DeliveryMode, StorefrontConfig};
pub use error::CheckoutError;
pub use session::SessionContext;
