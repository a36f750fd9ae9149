//! Checkout orchestration.
//!
//! A [`CheckoutSession`] combines the cart snapshot, an optional promo code
//! and the delivery charge into the order totals. Pricing itself is pure and
//! lives in `bazaar_core`; this module owns the two network round trips:
//!
//! - promo validation, gated locally so discounted carts never reach the API
//! - delivery quotes, recomputed whenever the order amount changes
//!
//! Delivery quotes are tagged with a ticket. A quote that completes after the
//! order amount has moved on is discarded, so the latest amount always wins
//! even if quotes overlap.

use std::future::Future;

use bazaar_core::checkout::{ensure_promo_eligible, subtotal};
use bazaar_core::{CartLineItem, OrderTotals, Price, PromoCode, UserId};
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiError, PromoCartItem, PromoValidation, PromoValidationRequest};
use crate::error::{CheckoutError, PROMO_FALLBACK_MESSAGE, Result};

/// The remote capabilities checkout depends on.
pub trait CheckoutBackend {
    /// Delivery charge for an order amount (after all discounts).
    fn delivery_charge(
        &self,
        order_amount: Price,
    ) -> impl Future<Output = std::result::Result<Price, ApiError>> + Send;

    /// Validate a promo code.
    fn validate_promo(
        &self,
        request: &PromoValidationRequest,
    ) -> impl Future<Output = std::result::Result<PromoValidation, ApiError>> + Send;
}

/// A promo code accepted by the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedPromo {
    pub code: String,
    pub discount: Price,
    pub message: String,
}

/// Identifies one delivery quote request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryQuoteTicket {
    order_amount: Price,
    generation: u64,
}

impl DeliveryQuoteTicket {
    /// The order amount this quote was requested for.
    #[must_use]
    pub const fn order_amount(&self) -> Price {
        self.order_amount
    }
}

#[derive(Debug, Default)]
struct DeliveryState {
    charge: Price,
    /// Order amount the current charge was quoted for.
    quoted_for: Option<Price>,
    generation: u64,
}

/// One customer's checkout.
#[derive(Debug)]
pub struct CheckoutSession<B> {
    backend: B,
    items: Vec<CartLineItem>,
    user_id: Option<UserId>,
    promo: Option<AppliedPromo>,
    delivery: DeliveryState,
}

impl<B: CheckoutBackend> CheckoutSession<B> {
    /// Start a checkout for a snapshot of cart lines.
    #[must_use]
    pub fn new(backend: B, items: Vec<CartLineItem>, user_id: Option<UserId>) -> Self {
        Self {
            backend,
            items,
            user_id,
            promo: None,
            delivery: DeliveryState::default(),
        }
    }

    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    #[must_use]
    pub const fn promo(&self) -> Option<&AppliedPromo> {
        self.promo.as_ref()
    }

    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub fn subtotal(&self) -> Price {
        subtotal(&self.items)
    }

    #[must_use]
    pub fn promo_discount(&self) -> Price {
        self.promo.as_ref().map_or(Price::ZERO, |p| p.discount)
    }

    /// Subtotal minus promo discount. Delivery is always quoted on this.
    #[must_use]
    pub fn order_amount(&self) -> Price {
        self.subtotal().saturating_sub(self.promo_discount())
    }

    /// The delivery charge currently in effect.
    #[must_use]
    pub const fn delivery_charge(&self) -> Price {
        self.delivery.charge
    }

    /// Whether the delivery charge was quoted for the current order amount.
    #[must_use]
    pub fn is_delivery_current(&self) -> bool {
        self.delivery.quoted_for == Some(self.order_amount())
    }

    /// The current money breakdown.
    #[must_use]
    pub fn totals(&self) -> OrderTotals {
        OrderTotals::new(self.subtotal(), self.promo_discount(), self.delivery.charge)
    }

    /// Apply a promo code.
    ///
    /// Carts with discounted items are refused before any request is made.
    /// On success the delivery charge is re-quoted for the new order amount.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is empty, the cart is ineligible, or the
    /// API rejects the code or cannot be reached. The discount stays at zero
    /// in every error case.
    #[instrument(skip(self, code))]
    pub async fn apply_promo(&mut self, code: &str) -> Result<AppliedPromo> {
        let code = PromoCode::parse(code)?;
        if let Err(err) = ensure_promo_eligible(&self.items) {
            info!(code = %code, "Promo code refused: cart has discounted items");
            return Err(err.into());
        }

        let had_promo = self.promo.take().is_some();
        let request = PromoValidationRequest {
            code: code.clone(),
            order_amount: self.subtotal(),
            user_id: self.user_id.clone(),
            cart_items: self.items.iter().map(PromoCartItem::from).collect(),
        };

        let outcome = match self.backend.validate_promo(&request).await {
            Ok(validation) if validation.valid => Ok(validation),
            Ok(validation) => {
                info!(code = %code, message = %validation.message, "Promo code rejected");
                Err(CheckoutError::PromoRejected(validation.message))
            }
            Err(err) => {
                warn!(code = %code, error = %err, "Promo validation failed");
                Err(CheckoutError::PromoRejected(
                    PROMO_FALLBACK_MESSAGE.to_string(),
                ))
            }
        };

        let validation = match outcome {
            Ok(validation) => validation,
            Err(err) => {
                if had_promo {
                    self.refresh_delivery_charge().await;
                }
                return Err(err);
            }
        };

        let discount = validation.discount.unwrap_or_default().non_negative();
        info!(code = %code, discount = %discount, "Promo code applied");
        let promo = AppliedPromo {
            code: validation.code.unwrap_or_else(|| code.to_string()),
            discount,
            message: validation.message,
        };
        self.promo = Some(promo.clone());
        self.refresh_delivery_charge().await;
        Ok(promo)
    }

    /// Remove the applied promo code, if any, and re-quote delivery.
    pub async fn remove_promo(&mut self) -> Option<AppliedPromo> {
        let removed = self.promo.take();
        if let Some(promo) = &removed {
            info!(code = %promo.code, "Promo code removed");
            self.refresh_delivery_charge().await;
        }
        removed
    }

    /// Replace the cart lines after a cart change and re-quote delivery.
    ///
    /// A promo code is dropped if the new lines include discounted items.
    pub async fn replace_items(&mut self, items: Vec<CartLineItem>) {
        self.items = items;
        if self.promo.is_some() && ensure_promo_eligible(&self.items).is_err() {
            info!("Cart now has discounted items, dropping promo code");
            self.promo = None;
        }
        self.refresh_delivery_charge().await;
    }

    /// Quote delivery for the current order amount and apply the result.
    ///
    /// Never fails: an unavailable delivery service means free delivery.
    pub async fn refresh_delivery_charge(&mut self) -> Price {
        let ticket = self.begin_delivery_quote();
        let result = self.backend.delivery_charge(ticket.order_amount).await;
        self.complete_delivery_quote(ticket, result);
        self.delivery.charge
    }

    /// Register a new delivery quote for the current order amount.
    ///
    /// Any ticket issued earlier becomes stale.
    pub fn begin_delivery_quote(&mut self) -> DeliveryQuoteTicket {
        self.delivery.generation += 1;
        DeliveryQuoteTicket {
            order_amount: self.order_amount(),
            generation: self.delivery.generation,
        }
    }

    /// Apply the outcome of a delivery quote.
    ///
    /// Returns `false` and leaves the charge untouched if the ticket is stale
    /// or the order amount changed since it was issued. A failed quote sets
    /// the charge to zero.
    pub fn complete_delivery_quote(
        &mut self,
        ticket: DeliveryQuoteTicket,
        result: std::result::Result<Price, ApiError>,
    ) -> bool {
        if ticket.generation != self.delivery.generation
            || ticket.order_amount != self.order_amount()
        {
            debug!(
                order_amount = %ticket.order_amount,
                "Discarding stale delivery quote"
            );
            return false;
        }

        self.delivery.charge = match result {
            Ok(charge) => charge.non_negative(),
            Err(err) => {
                warn!(
                    order_amount = %ticket.order_amount,
                    error = %err,
                    "Delivery charge calculation failed, defaulting to free delivery"
                );
                Price::ZERO
            }
        };
        self.delivery.quoted_for = Some(ticket.order_amount);
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bazaar_core::{ChargeType, DeliveryChargeRule, DeliveryTier, ProductId, calculate_delivery_charge};

    use super::*;

    fn rupees(n: i64) -> Price {
        Price::from_rupees(n)
    }

    fn line(id: &str, price: i64, original: i64, qty: u32) -> CartLineItem {
        CartLineItem {
            product_id: ProductId::new(id),
            name: None,
            selected_weight: None,
            qty,
            price: rupees(price),
            original_price: rupees(original),
        }
    }

    /// In-memory backend: delivery from local rules, scripted promo answers.
    #[derive(Default)]
    struct FakeBackend {
        rules: Vec<DeliveryChargeRule>,
        delivery_down: bool,
        promo_answers: Mutex<VecDeque<std::result::Result<PromoValidation, ApiError>>>,
        promo_calls: AtomicUsize,
        delivery_calls: Mutex<Vec<Price>>,
    }

    impl FakeBackend {
        fn with_tiers() -> Self {
            Self {
                rules: vec![DeliveryChargeRule {
                    tiers: vec![
                        DeliveryTier {
                            min_amount: rupees(0),
                            max_amount: Some(rupees(499)),
                            charge: rupees(50),
                        },
                        DeliveryTier {
                            min_amount: rupees(500),
                            max_amount: None,
                            charge: Price::ZERO,
                        },
                    ],
                    priority: 1,
                    ..DeliveryChargeRule::new(ChargeType::Tiered)
                }],
                ..Self::default()
            }
        }

        fn answer(self, answer: std::result::Result<PromoValidation, ApiError>) -> Self {
            self.promo_answers.lock().unwrap().push_back(answer);
            self
        }
    }

    impl CheckoutBackend for FakeBackend {
        async fn delivery_charge(&self, order_amount: Price) -> std::result::Result<Price, ApiError> {
            self.delivery_calls.lock().unwrap().push(order_amount);
            if self.delivery_down {
                return Err(ApiError::Status {
                    status: 503,
                    message: "unavailable".to_string(),
                });
            }
            Ok(calculate_delivery_charge(order_amount, &self.rules))
        }

        async fn validate_promo(
            &self,
            _request: &PromoValidationRequest,
        ) -> std::result::Result<PromoValidation, ApiError> {
            self.promo_calls.fetch_add(1, Ordering::SeqCst);
            self.promo_answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::NotFound("no scripted answer".to_string())))
        }
    }

    fn accepted(discount: i64) -> std::result::Result<PromoValidation, ApiError> {
        Ok(PromoValidation {
            valid: true,
            discount: Some(rupees(discount)),
            code: Some("SAVE".to_string()),
            message: "Promo code applied".to_string(),
        })
    }

    #[tokio::test]
    async fn test_delivery_is_quoted_on_order_amount() {
        let mut checkout = CheckoutSession::new(
            FakeBackend::with_tiers(),
            vec![line("a", 150, 150, 2)],
            None,
        );

        assert_eq!(checkout.refresh_delivery_charge().await, rupees(50));
        assert!(checkout.is_delivery_current());

        let totals = checkout.totals();
        assert_eq!(totals.subtotal, rupees(300));
        assert_eq!(totals.total, rupees(350));
    }

    #[tokio::test]
    async fn test_promo_refused_for_discounted_cart_without_network() {
        let mut checkout = CheckoutSession::new(
            FakeBackend::with_tiers().answer(accepted(50)),
            vec![line("a", 100, 120, 1)],
            None,
        );

        let err = checkout.apply_promo("SAVE").await.unwrap_err();
        assert!(matches!(err, CheckoutError::PromoIneligible(_)));
        assert!(!err.user_message().is_empty());
        assert_eq!(checkout.backend().promo_calls.load(Ordering::SeqCst), 0);
        assert_eq!(checkout.promo_discount(), Price::ZERO);
    }

    #[tokio::test]
    async fn test_promo_applied_and_delivery_requoted() {
        let mut checkout = CheckoutSession::new(
            FakeBackend::with_tiers().answer(accepted(150)),
            vec![line("a", 300, 300, 2)],
            Some(UserId::new("u-1")),
        );
        assert_eq!(checkout.refresh_delivery_charge().await, Price::ZERO);

        let promo = checkout.apply_promo("  SAVE ").await.unwrap();
        assert_eq!(promo.discount, rupees(150));
        assert_eq!(promo.code, "SAVE");

        // 600 - 150 = 450 falls in the paid tier.
        assert_eq!(checkout.order_amount(), rupees(450));
        assert_eq!(checkout.delivery_charge(), rupees(50));
        assert_eq!(checkout.totals().total, rupees(500));
        assert_eq!(
            checkout.backend().delivery_calls.lock().unwrap().last(),
            Some(&rupees(450))
        );

        let removed = checkout.remove_promo().await.unwrap();
        assert_eq!(removed.code, "SAVE");
        assert_eq!(checkout.delivery_charge(), Price::ZERO);
        assert_eq!(checkout.totals().total, rupees(600));
    }

    #[tokio::test]
    async fn test_invalid_promo_keeps_zero_discount() {
        let mut checkout = CheckoutSession::new(
            FakeBackend::with_tiers().answer(Ok(PromoValidation {
                valid: false,
                discount: Some(rupees(999)),
                code: None,
                message: "Code expired".to_string(),
            })),
            vec![line("a", 300, 300, 1)],
            None,
        );

        let err = checkout.apply_promo("OLD").await.unwrap_err();
        assert_eq!(err, CheckoutError::PromoRejected("Code expired".to_string()));
        assert_eq!(err.user_message(), "Code expired");
        assert!(checkout.promo().is_none());
        assert_eq!(checkout.promo_discount(), Price::ZERO);
    }

    #[tokio::test]
    async fn test_promo_service_failure_uses_fallback_message() {
        let mut checkout = CheckoutSession::new(
            FakeBackend::with_tiers().answer(Err(ApiError::Status {
                status: 500,
                message: "boom".to_string(),
            })),
            vec![line("a", 300, 300, 1)],
            None,
        );

        let err = checkout.apply_promo("SAVE").await.unwrap_err();
        assert_eq!(err.user_message(), PROMO_FALLBACK_MESSAGE);
        assert_eq!(checkout.promo_discount(), Price::ZERO);
    }

    #[tokio::test]
    async fn test_empty_promo_code_is_rejected_locally() {
        let mut checkout =
            CheckoutSession::new(FakeBackend::with_tiers(), vec![line("a", 300, 300, 1)], None);

        let err = checkout.apply_promo("   ").await.unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidPromoCode(_)));
        assert_eq!(checkout.backend().promo_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_replacing_promo_with_rejected_code_requotes_delivery() {
        let mut checkout = CheckoutSession::new(
            FakeBackend::with_tiers()
                .answer(accepted(150))
                .answer(Ok(PromoValidation {
                    valid: false,
                    discount: None,
                    code: None,
                    message: "Unknown code".to_string(),
                })),
            vec![line("a", 300, 300, 2)],
            None,
        );

        checkout.apply_promo("SAVE").await.unwrap();
        assert_eq!(checkout.delivery_charge(), rupees(50));

        assert!(checkout.apply_promo("NOPE").await.is_err());
        assert!(checkout.promo().is_none());
        assert_eq!(checkout.order_amount(), rupees(600));
        assert_eq!(checkout.delivery_charge(), Price::ZERO);
        assert!(checkout.is_delivery_current());
    }

    #[tokio::test]
    async fn test_delivery_failure_defaults_to_free() {
        let backend = FakeBackend {
            delivery_down: true,
            ..FakeBackend::with_tiers()
        };
        let mut checkout = CheckoutSession::new(backend, vec![line("a", 100, 100, 1)], None);

        assert_eq!(checkout.refresh_delivery_charge().await, Price::ZERO);
        assert_eq!(checkout.totals().total, rupees(100));
    }

    #[tokio::test]
    async fn test_cart_change_requotes_and_drops_ineligible_promo() {
        let mut checkout = CheckoutSession::new(
            FakeBackend::with_tiers().answer(accepted(100)),
            vec![line("a", 300, 300, 2)],
            None,
        );
        checkout.apply_promo("SAVE").await.unwrap();

        checkout
            .replace_items(vec![line("a", 300, 300, 3)])
            .await;
        assert_eq!(checkout.promo_discount(), rupees(100));
        assert_eq!(checkout.order_amount(), rupees(800));

        checkout
            .replace_items(vec![line("a", 300, 300, 1), line("b", 90, 100, 1)])
            .await;
        assert!(checkout.promo().is_none());
        assert_eq!(checkout.order_amount(), rupees(390));
        assert_eq!(checkout.delivery_charge(), rupees(50));
    }

    #[tokio::test]
    async fn test_stale_delivery_quote_is_discarded() {
        let mut checkout =
            CheckoutSession::new(FakeBackend::with_tiers(), vec![line("a", 300, 300, 2)], None);

        // A quote for 600 is in flight when the cart changes.
        let stale = checkout.begin_delivery_quote();
        assert_eq!(stale.order_amount(), rupees(600));

        checkout.items = vec![line("a", 300, 300, 1)];
        let fresh = checkout.begin_delivery_quote();
        assert!(checkout.complete_delivery_quote(fresh, Ok(rupees(50))));

        // The older quote arrives late and must not overwrite the newer charge.
        assert!(!checkout.complete_delivery_quote(stale, Ok(Price::ZERO)));
        assert_eq!(checkout.delivery_charge(), rupees(50));
        assert!(checkout.is_delivery_current());
    }

    #[tokio::test]
    async fn test_quote_for_outdated_amount_is_discarded() {
        let mut checkout =
            CheckoutSession::new(FakeBackend::with_tiers(), vec![line("a", 300, 300, 2)], None);

        let ticket = checkout.begin_delivery_quote();
        checkout.items.push(line("b", 10, 10, 1));

        assert!(!checkout.complete_delivery_quote(ticket, Ok(rupees(99))));
        assert_eq!(checkout.delivery_charge(), Price::ZERO);
        assert!(!checkout.is_delivery_current());
    }
}
