//! Router composition.

use crate::handlers::{access, admin, checkout, health, orders};
use crate::middleware::with_observability;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use canteen_orders::config::{CANCEL_PATH, SUCCESS_PATH};

/// Build the application router.
///
/// # Routes
///
/// - `GET /health`
/// - `POST /api/scan-qr/` - verify a pass, start a session
/// - `GET /api/session` - session status and menu
/// - `POST /logout`
/// - `POST /api/orders/` - in-person order
/// - `POST /api/checkout/` - stage hosted checkout
/// - `GET /payments/checkout-success/` and `GET /payments/checkout-cancel/`
/// - `GET /payment-error/`
///
/// With an admin token configured, also under `/admin`:
///
/// - `POST /passes`, `GET /passes?search=`
/// - `POST /passes/:id/reset`, `POST /passes/:id/deactivate`
/// - `GET /orders/summary`
pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/health", get(health::health_check))
        .route("/api/scan-qr/", post(access::scan))
        .route("/api/session", get(access::session_status))
        .route("/logout", post(access::logout))
        .route("/api/orders/", post(orders::create_order))
        .route("/api/checkout/", post(checkout::stage_checkout))
        .route(SUCCESS_PATH, get(checkout::checkout_success))
        .route(CANCEL_PATH, get(checkout::checkout_cancel))
        .route(checkout::PAYMENT_ERROR_VIEW, get(checkout::payment_error));

    if state.admin_token.is_some() {
        app = app.nest("/admin", admin_routes());
    } else {
        tracing::info!("Admin routes disabled: no admin token configured");
    }

    with_observability(app.with_state(state))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/passes", post(admin::issue_pass).get(admin::list_passes))
        .route("/passes/:id/reset", post(admin::reset_pass))
        .route("/passes/:id/deactivate", post(admin::deactivate_pass))
        .route("/orders/summary", get(admin::order_summary))
}
