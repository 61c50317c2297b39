//! Hosted checkout handlers: staging and the provider's return redirects.
//!
//! Return handlers never show why reconciliation failed; every failure
//! lands on the same payment-error view.

use crate::error::AppError;
use crate::extractors::{ApiJson, SessionCookie};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Query, State},
    response::Redirect,
};
use canteen_orders::CartItem;
use serde::{Deserialize, Serialize};

/// Where failed or unknown checkout returns are sent.
pub const PAYMENT_ERROR_VIEW: &str = "/payment-error/";

/// Where a cancelled checkout is sent.
pub const CANCELLED_VIEW: &str = "/success/?payment=cancelled";

/// Checkout staging request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutRequest {
    /// Cart entries.
    #[serde(default)]
    pub items: Vec<CartItem>,
}

/// Staged checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutResponse {
    /// Always `true`.
    pub success: bool,
    /// Provider page to redirect the buyer to.
    pub checkout_url: String,
}

/// Query of the provider's success redirect.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutReturn {
    /// Provider session reference.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Message body of the payment-error view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentErrorResponse {
    /// Always `false`.
    pub success: bool,
    /// Generic explanation.
    pub message: &'static str,
}

/// Stage a hosted checkout for the session holder's cart.
///
/// # Endpoint
///
/// ```text
/// POST /api/checkout/
/// Content-Type: application/json
///
/// { "items": [{ "id": 7, "quantity": 2 }] }
/// ```
///
/// 403 without a session, 500 when hosted checkout is not configured,
/// 400 for cart problems.
pub async fn stage_checkout(
    State(state): State<AppState>,
    session: SessionCookie,
    ApiJson(request): ApiJson<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, AppError> {
    let access = state.guard.require(session.token()).await?;

    let staged = state
        .checkout
        .stage(request.items, &access.owner_label)
        .await?;

    Ok(Json(CheckoutResponse {
        success: true,
        checkout_url: staged.checkout_url,
    }))
}

/// Provider success redirect: reconcile and show the confirmation.
///
/// A duplicate return racing the first one for the same ref is sent to the
/// same confirmation once the first has created the order.
///
/// # Endpoint
///
/// ```text
/// GET /payments/checkout-success/?session_id=<ref>
/// ```
pub async fn checkout_success(
    State(state): State<AppState>,
    Query(query): Query<CheckoutReturn>,
) -> Redirect {
    let Some(checkout_ref) = query.session_id.filter(|r| !r.is_empty()) else {
        return Redirect::to(PAYMENT_ERROR_VIEW);
    };

    match state.checkout.reconcile(&checkout_ref).await {
        Ok(order) => Redirect::to(&format!(
            "/success/?payment=success&order_id={}",
            order.id.0
        )),
        Err(_) => Redirect::to(PAYMENT_ERROR_VIEW),
    }
}

/// Provider cancel redirect. The stash is left to expire.
///
/// # Endpoint
///
/// ```text
/// GET /payments/checkout-cancel/
/// ```
#[allow(clippy::unused_async)]
pub async fn checkout_cancel() -> Redirect {
    Redirect::to(CANCELLED_VIEW)
}

/// Payment-error view.
#[allow(clippy::unused_async)]
pub async fn payment_error() -> Json<PaymentErrorResponse> {
    Json(PaymentErrorResponse {
        success: false,
        message: "Payment could not be completed. Please start checkout again.",
    })
}
