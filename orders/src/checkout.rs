//! Hosted checkout: staging a cart with the provider and reconciling the
//! provider's redirect into exactly one paid order.
//!
//! # Exactly-once
//!
//! A staged cart lives in the shared store under `checkout:stash:{ref}` for
//! one hour. Reconciliation:
//!
//! 1. takes a short claim (`INCR checkout:claim:{ref}` must return 1), so two
//!    concurrent returns for the same ref cannot both proceed; the loser
//!    waits briefly for the winner's order and answers with it
//! 2. reads the stash (absent = consumed, expired or unknown → fail)
//! 3. confirms with the provider that the session is paid
//! 4. builds the paid order with the ref attached, in one transaction
//! 5. deletes the stash, then releases the claim
//!
//! A replayed return finds no stash and fails. The order store also refuses
//! a second order with the same ref.

use crate::builder::{BuildRequest, OrderBuilder};
use crate::config::CheckoutConfig;
use crate::error::{OrderError, Result};
use crate::types::{CartItem, Order, OrderStatus, PaymentMethod, PaymentStatus};
use canteen_core::environment::Clock;
use canteen_core::kv::{self, KeyValueStore};
use canteen_core::Money;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// Key prefix of pending checkout stashes.
pub const STASH_PREFIX: &str = "checkout:stash:";

/// Key prefix of reconciliation claims.
pub const CLAIM_PREFIX: &str = "checkout:claim:";

/// Longest checkout reference accepted from a redirect.
const MAX_REF_LENGTH: usize = 255;

/// Poll interval while waiting on another return's claim.
const CLAIM_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Boxed future returned by [`CheckoutProvider`] operations.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

// ============================================================================
// Provider
// ============================================================================

/// One line item sent to the provider, priced in minor units.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutLineItem {
    /// Display name.
    pub name: String,
    /// Unit price.
    pub unit_amount: Money,
    /// Quantity.
    pub quantity: u32,
}

/// Request for a new hosted checkout session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    /// Lines to charge.
    pub line_items: Vec<CheckoutLineItem>,
    /// ISO currency code.
    pub currency: String,
    /// Redirect after payment.
    pub success_url: String,
    /// Redirect on cancel.
    pub cancel_url: String,
    /// Holder label, passed as metadata.
    pub owner_label: String,
}

/// A created hosted checkout session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutSession {
    /// Opaque session reference.
    pub id: String,
    /// Where to send the buyer.
    pub url: String,
}

/// Payment state reported by the provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderPaymentState {
    /// Funds captured.
    Paid,
    /// Not (yet) paid.
    Unpaid,
    /// Nothing to pay.
    NoPaymentRequired,
}

/// A provider session as retrieved after the redirect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutSessionStatus {
    /// Opaque session reference.
    pub id: String,
    /// Payment state.
    pub payment_state: ProviderPaymentState,
}

/// Remote hosted checkout service.
///
/// # Dyn Compatibility
///
/// Methods return boxed futures so services can hold `Arc<dyn CheckoutProvider>`.
pub trait CheckoutProvider: Send + Sync {
    /// Create a checkout session.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::ProviderUnavailable` on transport or API failure.
    fn create_session(&self, request: CheckoutSessionRequest) -> ProviderFuture<'_, CheckoutSession>;

    /// Retrieve a checkout session.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::ProviderUnavailable` on transport or API failure.
    fn retrieve_session(&self, id: String) -> ProviderFuture<'_, CheckoutSessionStatus>;
}

// ============================================================================
// Reconciler
// ============================================================================

/// Cart stashed while the buyer is at the provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCheckout {
    /// Raw cart as submitted.
    pub items: Vec<CartItem>,
    /// Holder label.
    pub owner_label: String,
}

/// Result of staging a checkout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StagedCheckout {
    /// Provider session reference.
    pub checkout_ref: String,
    /// Where to redirect the buyer.
    pub checkout_url: String,
}

/// Stages carts with the provider and reconciles returns.
#[derive(Clone)]
pub struct CheckoutReconciler {
    provider: Option<Arc<dyn CheckoutProvider>>,
    kv: Arc<dyn KeyValueStore>,
    builder: OrderBuilder,
    clock: Arc<dyn Clock>,
    config: CheckoutConfig,
}

impl CheckoutReconciler {
    /// Create a reconciler. `provider = None` disables hosted checkout.
    #[must_use]
    pub fn new(
        provider: Option<Arc<dyn CheckoutProvider>>,
        kv: Arc<dyn KeyValueStore>,
        builder: OrderBuilder,
        clock: Arc<dyn Clock>,
        config: CheckoutConfig,
    ) -> Self {
        Self {
            provider,
            kv,
            builder,
            clock,
            config,
        }
    }

    /// Whether a provider is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    fn provider(&self) -> Result<&Arc<dyn CheckoutProvider>> {
        self.provider.as_ref().ok_or(OrderError::ProviderNotConfigured)
    }

    fn stash_key(checkout_ref: &str) -> String {
        format!("{STASH_PREFIX}{checkout_ref}")
    }

    fn claim_key(checkout_ref: &str) -> String {
        format!("{CLAIM_PREFIX}{checkout_ref}")
    }

    /// Validate a cart, open a provider session for it and stash the cart.
    ///
    /// # Errors
    ///
    /// - `OrderError::ProviderNotConfigured` without a provider
    /// - cart errors from validation
    /// - `OrderError::ProviderUnavailable` if the provider fails
    /// - `OrderError::StoreUnavailable` if the stash cannot be written
    pub async fn stage(&self, items: Vec<CartItem>, owner_label: &str) -> Result<StagedCheckout> {
        let provider = self.provider()?;
        let cart = self.builder.validate(&items).await?;

        let request = CheckoutSessionRequest {
            line_items: cart
                .lines()
                .iter()
                .map(|line| CheckoutLineItem {
                    name: line.item.name.clone(),
                    unit_amount: line.item.price,
                    quantity: line.quantity,
                })
                .collect(),
            currency: self.config.currency.clone(),
            success_url: self.config.success_url.clone(),
            cancel_url: self.config.cancel_url.clone(),
            owner_label: owner_label.to_string(),
        };
        let session = provider.create_session(request).await?;

        let pending = PendingCheckout {
            items,
            owner_label: owner_label.to_string(),
        };
        kv::set_json(
            self.kv.as_ref(),
            &Self::stash_key(&session.id),
            &pending,
            Some(self.config.stash_ttl),
        )
        .await?;

        metrics::counter!("checkout.staged").increment(1);
        tracing::info!(checkout_ref = %session.id, owner_label, "Checkout staged");

        Ok(StagedCheckout {
            checkout_ref: session.id,
            checkout_url: session.url,
        })
    }

    /// Exchange a provider return for a paid order, at most once per ref.
    ///
    /// A return that arrives while another one holds the claim gets the
    /// other return's order, if it is created within `claim_wait`.
    ///
    /// # Errors
    ///
    /// `OrderError::ReconciliationFailed` when the ref is unknown, consumed,
    /// expired, still being reconciled after `claim_wait`, or not paid. Other errors
    /// (provider, store, stock) are returned as-is; all of them are terminal
    /// for this checkout attempt.
    pub async fn reconcile(&self, checkout_ref: &str) -> Result<Order> {
        let result = self.reconcile_inner(checkout_ref).await;

        let outcome = match &result {
            Ok(_) => "paid",
            Err(OrderError::ReconciliationFailed(_)) => "rejected",
            Err(_) => "error",
        };
        metrics::counter!("checkout.reconciled", "outcome" => outcome).increment(1);
        if let Err(e) = &result {
            tracing::warn!(checkout_ref, error = %e, "Checkout reconciliation failed");
        }

        result
    }

    async fn reconcile_inner(&self, checkout_ref: &str) -> Result<Order> {
        let provider = self.provider()?;
        if checkout_ref.is_empty() || checkout_ref.len() > MAX_REF_LENGTH {
            return Err(OrderError::ReconciliationFailed(
                "malformed checkout reference".to_string(),
            ));
        }

        let claim_key = Self::claim_key(checkout_ref);
        if self.kv.incr(&claim_key, self.config.claim_ttl).await? != 1 {
            return self.await_claim_holder(checkout_ref).await;
        }

        let result = self.consume(provider, checkout_ref).await;

        if let Err(e) = self.kv.delete(&claim_key).await {
            tracing::warn!(checkout_ref, error = %e, "Failed to release checkout claim");
        }
        result
    }

    /// Wait for the return holding the claim to create its order.
    async fn await_claim_holder(&self, checkout_ref: &str) -> Result<Order> {
        let deadline = tokio::time::Instant::now() + self.config.claim_wait;
        loop {
            if let Some(order) = self
                .builder
                .store()
                .find_by_checkout_ref(checkout_ref.to_string())
                .await?
            {
                tracing::debug!(
                    checkout_ref,
                    order_id = %order.id,
                    "Concurrent return joined existing order"
                );
                return Ok(order);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(OrderError::ReconciliationFailed(
                    "reconciliation already in progress".to_string(),
                ));
            }
            tokio::time::sleep(CLAIM_POLL_INTERVAL).await;
        }
    }

    async fn consume(&self, provider: &Arc<dyn CheckoutProvider>, checkout_ref: &str) -> Result<Order> {
        let stash_key = Self::stash_key(checkout_ref);
        let Some(pending) =
            kv::get_json::<PendingCheckout>(self.kv.as_ref(), &stash_key).await?
        else {
            return Err(OrderError::ReconciliationFailed(
                "no pending checkout".to_string(),
            ));
        };

        let status = provider.retrieve_session(checkout_ref.to_string()).await?;
        if status.id != checkout_ref {
            return Err(OrderError::ReconciliationFailed(
                "provider returned a different session".to_string(),
            ));
        }
        if status.payment_state != ProviderPaymentState::Paid {
            return Err(OrderError::ReconciliationFailed(
                "checkout session is not paid".to_string(),
            ));
        }

        if self
            .builder
            .store()
            .find_by_checkout_ref(checkout_ref.to_string())
            .await?
            .is_some()
        {
            self.kv.delete(&stash_key).await?;
            return Err(OrderError::ReconciliationFailed(
                "order already exists for checkout".to_string(),
            ));
        }

        let cart = self.builder.validate(&pending.items).await?;
        let order = self
            .builder
            .build(
                cart,
                BuildRequest {
                    owner_label: pending.owner_label,
                    payment_method: PaymentMethod::HostedRedirect,
                    payment_status: PaymentStatus::Paid,
                    status: OrderStatus::Paid,
                    paid_at: Some(self.clock.now()),
                    external_checkout_ref: Some(checkout_ref.to_string()),
                },
            )
            .await?;

        if let Err(e) = self.kv.delete(&stash_key).await {
            tracing::warn!(checkout_ref, error = %e, "Failed to delete consumed checkout stash");
        }
        tracing::info!(checkout_ref, order_id = %order.id, "Checkout reconciled");
        Ok(order)
    }
}
