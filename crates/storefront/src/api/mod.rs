//! Storefront REST API client.
//!
//! # Architecture
//!
//! - The API is the source of truth for products, promo codes and delivery
//!   rules; nothing is persisted locally
//! - In-memory caching via `moka` for catalog lookups and delivery rules
//! - Delivery charges are either quoted by the API (`remote` mode) or
//!   computed in-process from the active rules (`local` mode); both follow
//!   the same resolver in `bazaar_core::delivery`
//!
//! # Endpoints
//!
//! - `POST /delivery-charges/calculate` - quote for an order amount
//! - `GET /delivery-charges/active` - active delivery rules
//! - `POST /promo-codes/validate` - promo code check
//! - `GET /products/{id}` - single product

mod cache;
pub mod types;

use std::sync::Arc;

use bazaar_core::{DeliveryChargeRule, Price, Product, ProductId, calculate_delivery_charge};
use moka::future::Cache;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::checkout::CheckoutBackend;
use crate::config::{ApiConfig, DeliveryMode};

use cache::{CacheKey, CacheValue};
pub use types::{
    DeliveryChargeRequest, DeliveryChargeResponse, PromoCartItem, PromoValidation,
    PromoValidationRequest,
};

/// Longest slice of a response body kept in error messages and logs.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Errors that can occur when talking to the storefront API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, TLS...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// Response body was not the expected JSON.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Client for the storefront REST API.
///
/// Cheap to clone; clones share the HTTP connection pool and cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    delivery_mode: DeliveryMode,
    cache: Cache<CacheKey, CacheValue>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.rules_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
                token: config.token.as_ref().map(|t| t.expose_secret().to_string()),
                delivery_mode: config.delivery_mode,
                cache,
            }),
        })
    }

    /// Which delivery-charge strategy this client uses.
    #[must_use]
    pub fn delivery_mode(&self) -> DeliveryMode {
        self.inner.delivery_mode
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.inner.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.inner.client.request(method, self.endpoint(path));
        match &self.inner.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and decode a JSON success body.
    async fn send<T: DeserializeOwned>(&self, builder: reqwest::RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %truncate(&body),
                "Storefront API returned non-success status"
            );
            return Err(status_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %truncate(&body),
                "Failed to parse storefront API response"
            );
            ApiError::Parse(e)
        })
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(self.request(reqwest::Method::POST, path).json(body))
            .await
    }

    /// Ask the API for the delivery charge of an order.
    ///
    /// `order_amount` must already include product discounts and any promo code.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response is malformed.
    #[instrument(skip_all, fields(order_amount = %order_amount))]
    pub async fn calculate_delivery_charge(&self, order_amount: Price) -> Result<Price, ApiError> {
        let response: DeliveryChargeResponse = self
            .post(
                "delivery-charges/calculate",
                &DeliveryChargeRequest { order_amount },
            )
            .await?;
        debug!(delivery_charge = %response.delivery_charge, "Delivery charge quoted");
        Ok(response.delivery_charge.non_negative())
    }

    /// Fetch the active delivery charge rules.
    ///
    /// Cached for the configured rules TTL.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response is malformed.
    #[instrument(skip(self))]
    pub async fn active_delivery_rules(&self) -> Result<Arc<[DeliveryChargeRule]>, ApiError> {
        if let Some(CacheValue::DeliveryRules(rules)) =
            self.inner.cache.get(&CacheKey::ActiveDeliveryRules).await
        {
            debug!("Cache hit for delivery rules");
            return Ok(rules);
        }

        let rules: Vec<DeliveryChargeRule> = self
            .send(self.request(reqwest::Method::GET, "delivery-charges/active"))
            .await?;
        let rules: Arc<[DeliveryChargeRule]> = rules.into();
        debug!(count = rules.len(), "Fetched delivery rules");

        self.inner
            .cache
            .insert(
                CacheKey::ActiveDeliveryRules,
                CacheValue::DeliveryRules(Arc::clone(&rules)),
            )
            .await;

        Ok(rules)
    }

    /// Compute the delivery charge in-process from the active rules.
    ///
    /// # Errors
    ///
    /// Returns error if the rules cannot be fetched.
    pub async fn local_delivery_charge(&self, order_amount: Price) -> Result<Price, ApiError> {
        let rules = self.active_delivery_rules().await?;
        Ok(calculate_delivery_charge(order_amount, &rules))
    }

    /// Validate a promo code against the current cart.
    ///
    /// A rejected code is not an error: the API answers `valid: false` with a
    /// message, sometimes alongside a 4xx status.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response is malformed.
    #[instrument(skip(self, request), fields(code = %request.code, order_amount = %request.order_amount))]
    pub async fn validate_promo_code(
        &self,
        request: &PromoValidationRequest,
    ) -> Result<PromoValidation, ApiError> {
        let response = self
            .request(reqwest::Method::POST, "promo-codes/validate")
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_client_error()
            && let Some(rejection) = promo_rejection(&body)
        {
            debug!(status = %status, message = %rejection.message, "Promo code rejected");
            return Ok(rejection);
        }

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %truncate(&body),
                "Promo validation returned non-success status"
            );
            return Err(status_error(status, &body));
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Get a product by ID.
    ///
    /// Cached for the configured rules TTL, whatever the delivery mode.
    ///
    /// # Errors
    ///
    /// Returns error if the product does not exist or the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Arc<Product>, ApiError> {
        let cache_key = CacheKey::Product(id.clone());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let path = format!("products/{id}");
        let product: Product = match self.send(self.request(reqwest::Method::GET, &path)).await {
            Err(ApiError::Status { status: 404, .. }) => {
                return Err(ApiError::NotFound(format!("Product not found: {id}")));
            }
            other => other?,
        };
        let product = Arc::new(product);

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Arc::clone(&product)))
            .await;

        Ok(product)
    }
}

impl CheckoutBackend for ApiClient {
    async fn delivery_charge(&self, order_amount: Price) -> Result<Price, ApiError> {
        match self.inner.delivery_mode {
            DeliveryMode::Remote => self.calculate_delivery_charge(order_amount).await,
            DeliveryMode::Local => self.local_delivery_charge(order_amount).await,
        }
    }

    async fn validate_promo(
        &self,
        request: &PromoValidationRequest,
    ) -> Result<PromoValidation, ApiError> {
        self.validate_promo_code(request).await
    }
}

/// Build an [`ApiError::Status`], preferring the API's `message` field.
fn status_error(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<types::ErrorBody>(body)
        .map_or_else(|_| truncate(body), |e| e.message);
    ApiError::Status {
        status: status.as_u16(),
        message,
    }
}

/// Read a 4xx promo response as a rejection.
///
/// Accepts a full validation body or a bare `{"message": ...}` error body.
/// Returns `None` when there is no message to show the customer.
fn promo_rejection(body: &str) -> Option<PromoValidation> {
    if let Ok(validation) = serde_json::from_str::<PromoValidation>(body) {
        return Some(PromoValidation {
            valid: false,
            ..validation
        });
    }

    serde_json::from_str::<types::ErrorBody>(body)
        .ok()
        .filter(|e| !e.message.trim().is_empty())
        .map(|e| PromoValidation {
            valid: false,
            discount: None,
            code: None,
            message: e.message,
        })
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY_CHARS).collect()
}
