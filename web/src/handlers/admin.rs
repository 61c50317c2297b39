//! Pass administration and order overview.
//!
//! Mounted under `/admin` only when an admin token is configured. Every
//! handler takes [`AdminAuth`], so a request without the bearer token never
//! reaches the registry.

use crate::error::AppError;
use crate::extractors::{AdminAuth, ApiJson};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use canteen_auth::{IssuedPass, PassId, PassSummary};
use serde::{Deserialize, Serialize};

/// Issue request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssuePassRequest {
    /// Holder label; blank means none.
    #[serde(default)]
    pub owner_label: Option<String>,
}

/// Search query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PassSearch {
    /// Owner-label substring.
    #[serde(default)]
    pub search: Option<String>,
}

/// Paid totals for the overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSummaryResponse {
    /// Sum of paid order totals, `"12.50"`.
    pub paid_total: String,
    /// Paid orders.
    pub paid_count: u64,
    /// Orders awaiting payment.
    pub pending_count: u64,
}

// The plaintext code is in this body and nowhere else; keep it out of caches.
fn issued(pass: IssuedPass) -> Response {
    ([(header::CACHE_CONTROL, "no-store")], Json(pass)).into_response()
}

/// `POST /admin/passes`: issue a pass and show its code once.
pub async fn issue_pass(
    _admin: AdminAuth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<IssuePassRequest>,
) -> Result<Response, AppError> {
    let owner_label = request
        .owner_label
        .map(|label| label.trim().to_string())
        .filter(|label| !label.is_empty());
    let pass = state.registry.issue(owner_label).await?;
    Ok(issued(pass))
}

/// `POST /admin/passes/:id/reset`: new code and expiry, use count zeroed.
pub async fn reset_pass(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let pass = state.registry.reset(PassId(id)).await?;
    Ok(issued(pass))
}

/// `POST /admin/passes/:id/deactivate`.
pub async fn deactivate_pass(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PassSummary>, AppError> {
    Ok(Json(state.registry.deactivate(PassId(id)).await?))
}

/// `GET /admin/passes?search=`: newest first, hashes never included.
pub async fn list_passes(
    _admin: AdminAuth,
    State(state): State<AppState>,
    Query(query): Query<PassSearch>,
) -> Result<Json<Vec<PassSummary>>, AppError> {
    let search = query
        .search
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    Ok(Json(state.registry.search(search).await?))
}

/// `GET /admin/orders/summary`.
pub async fn order_summary(
    _admin: AdminAuth,
    State(state): State<AppState>,
) -> Result<Json<OrderSummaryResponse>, AppError> {
    let summary = state.orders.store().summary().await?;
    Ok(Json(OrderSummaryResponse {
        paid_total: summary.paid_total.to_string(),
        paid_count: summary.paid_count,
        pending_count: summary.pending_count,
    }))
}
