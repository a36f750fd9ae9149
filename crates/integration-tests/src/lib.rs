//! Integration tests for Bazaar.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bazaar-integration-tests
//! ```
//!
//! # Mock API
//!
//! [`MockApi`] serves the storefront REST endpoints from in-memory state on an
//! ephemeral local port, so the real [`ApiClient`] and checkout flow can be
//! exercised without a backend:
//!
//! - `POST /api/delivery-charges/calculate` - runs the configured rules
//! - `GET /api/delivery-charges/active` - returns the configured rules
//! - `POST /api/promo-codes/validate` - known codes are valid, others get a 400
//!   (a validation body, or a bare error body when configured)
//! - `GET /api/products/{id}` - configured products, 404 otherwise
//!
//! Every endpoint counts its calls, and the delivery and promo endpoints can be
//! switched into failure mode.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bazaar_core::{DeliveryChargeRule, Price, Product, calculate_delivery_charge};
use bazaar_storefront::{ApiClient, ApiConfig, ApiError, DeliveryMode};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

/// Backing data and call log of a [`MockApi`].
#[derive(Debug, Default)]
pub struct MockState {
    pub rules: Mutex<Vec<DeliveryChargeRule>>,
    pub products: Mutex<HashMap<String, Product>>,
    /// Valid promo codes and the discount each grants.
    pub promo_codes: Mutex<HashMap<String, Price>>,
    /// When set, unknown codes get a bare `{"message": ...}` 400 body
    /// instead of a validation result.
    pub promo_error_message: Mutex<Option<String>>,

    /// Answer delivery quotes with a 500.
    pub delivery_down: AtomicBool,
    /// Answer promo validations with a 503.
    pub promo_down: AtomicBool,

    pub delivery_calls: AtomicUsize,
    pub rules_calls: AtomicUsize,
    pub promo_calls: AtomicUsize,
    pub product_calls: AtomicUsize,

    /// Order amounts received by the delivery endpoint, in arrival order.
    pub quoted_amounts: Mutex<Vec<Price>>,
    /// Raw promo validation bodies, in arrival order.
    pub promo_requests: Mutex<Vec<Value>>,
    /// Last `Authorization` header seen on any endpoint.
    pub authorization: Mutex<Option<String>>,
}

impl MockState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_rules(self, rules: Vec<DeliveryChargeRule>) -> Self {
        *lock(&self.rules) = rules;
        self
    }

    #[must_use]
    pub fn with_product(self, product: Product) -> Self {
        lock(&self.products).insert(product.id.to_string(), product);
        self
    }

    #[must_use]
    pub fn with_promo(self, code: &str, discount: Price) -> Self {
        lock(&self.promo_codes).insert(code.to_string(), discount);
        self
    }

    #[must_use]
    pub fn with_promo_error_message(self, message: &str) -> Self {
        *lock(&self.promo_error_message) = Some(message.to_string());
        self
    }

    pub fn set_delivery_down(&self, down: bool) {
        self.delivery_down.store(down, Ordering::SeqCst);
    }

    pub fn set_promo_down(&self, down: bool) {
        self.promo_down.store(down, Ordering::SeqCst);
    }

    #[must_use]
    pub fn delivery_calls(&self) -> usize {
        self.delivery_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn rules_calls(&self) -> usize {
        self.rules_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn promo_calls(&self) -> usize {
        self.promo_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn product_calls(&self) -> usize {
        self.product_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn quoted_amounts(&self) -> Vec<Price> {
        lock(&self.quoted_amounts).clone()
    }

    #[must_use]
    pub fn promo_requests(&self) -> Vec<Value> {
        lock(&self.promo_requests).clone()
    }

    #[must_use]
    pub fn authorization(&self) -> Option<String> {
        lock(&self.authorization).clone()
    }

    fn record_authorization(&self, headers: &HeaderMap) {
        if let Some(value) = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
        {
            *lock(&self.authorization) = Some(value.to_string());
        }
    }
}

/// A storefront API double listening on `127.0.0.1`.
///
/// The server task stops when the value is dropped.
pub struct MockApi {
    base_url: Url,
    state: Arc<MockState>,
    server: JoinHandle<()>,
}

impl MockApi {
    /// Bind an ephemeral port and start serving `state`.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start(state: MockState) -> std::io::Result<Self> {
        let state = Arc::new(state);
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;

        let app = Router::new().nest("/api", routes(Arc::clone(&state)));
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let base_url = Url::parse(&format!("http://{addr}/api/"))
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        Ok(Self {
            base_url,
            state,
            server,
        })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn state(&self) -> &MockState {
        &self.state
    }

    /// Client configuration pointing at this server.
    #[must_use]
    pub fn config(&self, delivery_mode: DeliveryMode) -> ApiConfig {
        ApiConfig {
            delivery_mode,
            ..ApiConfig::new(self.base_url.clone())
        }
    }

    /// An API client pointing at this server.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn client(&self, delivery_mode: DeliveryMode) -> Result<ApiClient, ApiError> {
        ApiClient::new(&self.config(delivery_mode))
    }
}

impl Drop for MockApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn routes(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/delivery-charges/calculate", post(calculate_delivery))
        .route("/delivery-charges/active", get(active_rules))
        .route("/promo-codes/validate", post(validate_promo))
        .route("/products/{id}", get(product))
        .with_state(state)
}

async fn calculate_delivery(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record_authorization(&headers);
    state.delivery_calls.fetch_add(1, Ordering::SeqCst);

    if state.delivery_down.load(Ordering::SeqCst) {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Delivery service unavailable");
    }

    let Some(amount) = body
        .get("orderAmount")
        .cloned()
        .and_then(|v| serde_json::from_value::<Price>(v).ok())
    else {
        return error(StatusCode::BAD_REQUEST, "orderAmount is required");
    };

    lock(&state.quoted_amounts).push(amount);
    let charge = calculate_delivery_charge(amount, &lock(&state.rules));
    Json(json!({ "deliveryCharge": charge })).into_response()
}

async fn active_rules(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.record_authorization(&headers);
    state.rules_calls.fetch_add(1, Ordering::SeqCst);

    let rules = lock(&state.rules).clone();
    Json(rules).into_response()
}

async fn validate_promo(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record_authorization(&headers);
    state.promo_calls.fetch_add(1, Ordering::SeqCst);
    lock(&state.promo_requests).push(body.clone());

    if state.promo_down.load(Ordering::SeqCst) {
        return error(StatusCode::SERVICE_UNAVAILABLE, "Promo service unavailable");
    }

    let code = body.get("code").and_then(Value::as_str).unwrap_or_default();
    let discount = lock(&state.promo_codes).get(code).copied();
    let error_message = lock(&state.promo_error_message).clone();
    match discount {
        Some(discount) => Json(json!({
            "valid": true,
            "discount": discount,
            "code": code,
            "message": "Promo code applied successfully",
        }))
        .into_response(),
        None => match error_message {
            Some(message) => error(StatusCode::BAD_REQUEST, &message),
            None => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "valid": false,
                    "message": "Invalid or expired promo code",
                })),
            )
                .into_response(),
        },
    }
}

async fn product(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    state.record_authorization(&headers);
    state.product_calls.fetch_add(1, Ordering::SeqCst);

    let product = lock(&state.products).get(&id).cloned();
    product.map_or_else(
        || error(StatusCode::NOT_FOUND, "Product not found"),
        |product| Json(product).into_response(),
    )
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
