//! In-person order handler.

use crate::error::AppError;
use crate::extractors::{ApiJson, SessionCookie};
use crate::state::AppState;
use axum::{Json, extract::State};
use canteen_orders::CartItem;
use serde::{Deserialize, Serialize};

/// Order request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateOrderRequest {
    /// Cart entries.
    #[serde(default)]
    pub items: Vec<CartItem>,
    /// `in_person` when omitted.
    #[serde(default)]
    pub payment_method: Option<String>,
}

/// Created order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateOrderResponse {
    /// Always `true`.
    pub success: bool,
    /// New order id.
    pub order_id: i64,
    /// Order total, `"7.00"`.
    pub total_amount: String,
}

/// Place an in-person order for the session holder.
///
/// # Endpoint
///
/// ```text
/// POST /api/orders/
/// Content-Type: application/json
///
/// { "items": [{ "id": 7, "quantity": 2 }], "payment_method": "in_person" }
/// ```
///
/// # Responses
///
/// - 200 `{ success, order_id, total_amount }`
/// - 400 cart problem with a specific message
/// - 403 no active session
pub async fn create_order(
    State(state): State<AppState>,
    session: SessionCookie,
    ApiJson(request): ApiJson<CreateOrderRequest>,
) -> Result<Json<CreateOrderResponse>, AppError> {
    let access = state.guard.require(session.token()).await?;

    let order = state
        .orders
        .place_in_person(
            &request.items,
            request.payment_method.as_deref(),
            &access.owner_label,
        )
        .await?;

    Ok(Json(CreateOrderResponse {
        success: true,
        order_id: order.id.0,
        total_amount: order.total_amount.to_string(),
    }))
}
