//! Pass verification and access session handlers.

use crate::error::AppError;
use crate::extractors::{ApiJson, ClientIp, SessionCookie};
use crate::state::AppState;
use axum::{
    Json,
    extract::State,
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use canteen_auth::constants::messages;
use canteen_auth::{AccessError, SessionStatus};
use canteen_orders::CatalogItem;
use serde::{Deserialize, Serialize};

/// Where the client goes after a successful scan.
pub const SUCCESS_VIEW: &str = "/success/";

/// Verification request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanRequest {
    /// Scanned QR payload.
    #[serde(default)]
    pub data: String,
}

/// Verification outcome. Match and no-match both use this shape with 200.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanResponse {
    /// Whether a session was issued.
    pub success: bool,
    /// Human message; never says why a code failed.
    pub message: &'static str,
    /// Same as `success`.
    pub valid: bool,
    /// Next view on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<&'static str>,
}

impl ScanResponse {
    const fn valid() -> Self {
        Self {
            success: true,
            message: messages::PASS_VALID,
            valid: true,
            redirect_url: Some(SUCCESS_VIEW),
        }
    }

    const fn invalid() -> Self {
        Self {
            success: false,
            message: messages::INVALID_OR_EXPIRED,
            valid: false,
            redirect_url: None,
        }
    }
}

/// Verify a scanned code and start an access session.
///
/// # Endpoint
///
/// ```text
/// POST /api/scan-qr/
/// Content-Type: application/json
///
/// { "data": "<code>" }
/// ```
///
/// # Responses
///
/// - 200 `{ success: true, valid: true, redirect_url }` with a session cookie
/// - 200 `{ success: false, valid: false }` for any non-matching code
/// - 400 empty or oversized code, malformed body
/// - 429 rate limited
///
/// A malformed body still spends one of the client's attempts.
pub async fn scan(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    session: SessionCookie,
    body: Result<ApiJson<ScanRequest>, AppError>,
) -> Result<Response, AppError> {
    let client_key = client_ip.to_string();
    let request = match body {
        Ok(ApiJson(request)) => request,
        Err(rejection) => {
            state.verifier.record_unreadable(&client_key).await?;
            return Err(rejection);
        }
    };

    match state
        .verifier
        .verify(&request.data, &client_key, session.token())
        .await
    {
        Ok(verified) => {
            let cookie = state.session_cookie(verified.token.as_str());
            Ok(([(header::SET_COOKIE, cookie)], Json(ScanResponse::valid())).into_response())
        }
        Err(AccessError::InvalidCode) => Ok(Json(ScanResponse::invalid()).into_response()),
        Err(e) => Err(e.into()),
    }
}

/// One menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    /// Catalog id, used in carts.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Unit price, `"3.50"`.
    pub price: String,
    /// Units left.
    pub stock_count: u32,
}

impl From<CatalogItem> for MenuItem {
    fn from(item: CatalogItem) -> Self {
        Self {
            id: item.id.0,
            name: item.name,
            price: item.price.to_string(),
            stock_count: item.stock_count,
        }
    }
}

/// Active session details with the menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStatusResponse {
    /// Always `true`; other states are errors.
    pub authenticated: bool,
    /// Pass holder.
    pub owner_label: String,
    /// Seconds until the session ends.
    pub remaining_seconds: i64,
    /// Available items ordered by name.
    pub menu: Vec<MenuItem>,
}

/// Session status and menu.
///
/// # Endpoint
///
/// ```text
/// GET /api/session
/// ```
///
/// 403 "Session expired" when the session just ran out, 403
/// "Not authenticated" when there is none.
pub async fn session_status(
    State(state): State<AppState>,
    session: SessionCookie,
) -> Result<Json<SessionStatusResponse>, AppError> {
    match state.guard.status(session.token()).await? {
        SessionStatus::Active { session, remaining } => {
            let menu = state.orders.menu().await?;
            Ok(Json(SessionStatusResponse {
                authenticated: true,
                owner_label: session.owner_label,
                remaining_seconds: remaining.num_seconds().max(0),
                menu: menu.into_iter().map(MenuItem::from).collect(),
            }))
        }
        SessionStatus::Expired => Err(AccessError::SessionExpired.into()),
        SessionStatus::Absent => Err(AccessError::Unauthenticated.into()),
    }
}

/// End the access session and drop the cookie, then go home.
///
/// # Endpoint
///
/// ```text
/// POST /logout
/// ```
pub async fn logout(
    State(state): State<AppState>,
    session: SessionCookie,
) -> Result<Response, AppError> {
    if let Some(token) = session.token() {
        state.guard.clear(token).await?;
        tracing::debug!("Access session cleared on logout");
    }
    Ok((
        [(header::SET_COOKIE, state.cleared_session_cookie())],
        Redirect::to("/"),
    )
        .into_response())
}
