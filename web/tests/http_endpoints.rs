//! End-to-end HTTP tests against the full router with in-memory backends.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request, StatusCode, header};
use canteen_auth::mocks::MockPassRepository;
use canteen_auth::{AccessConfig, AccessServices, HashCost};
use canteen_core::{KeyValueStore, Money};
use canteen_orders::checkout::CLAIM_PREFIX;
use canteen_orders::mocks::{InMemoryOrderStore, MockCheckoutProvider};
use canteen_orders::{
    CatalogItem, CatalogItemId, CheckoutConfig, CheckoutProvider, CheckoutReconciler, OrderBuilder,
    PaymentStatus,
};
use canteen_testing::{FixedClock, InMemoryKeyValueStore, test_clock};
use canteen_web::{AppState, REQUEST_ID_HEADER, router};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const ADMIN_TOKEN: &str = "admin-secret";

struct Harness {
    app: Router,
    state: AppState,
    store: InMemoryOrderStore,
    provider: MockCheckoutProvider,
    kv: InMemoryKeyValueStore,
    clock: FixedClock,
}

fn harness_with(hosted_checkout: bool, admin_token: Option<&str>) -> Harness {
    canteen_testing::init_test_tracing();

    let clock = test_clock();
    let kv = InMemoryKeyValueStore::new(Arc::new(clock.clone()));
    let repo = MockPassRepository::new();
    let config = AccessConfig::default().with_hash_cost(HashCost::minimal());
    let access = AccessServices::new(
        &config,
        Arc::new(repo),
        Arc::new(kv.clone()),
        Arc::new(clock.clone()),
    )
    .unwrap();

    let store = InMemoryOrderStore::with_items([
        CatalogItem {
            id: CatalogItemId(7),
            name: "Soup".to_string(),
            price: Money::from_cents(350),
            stock_count: 5,
            is_available: true,
        },
        CatalogItem {
            id: CatalogItemId(8),
            name: "Bread".to_string(),
            price: Money::from_cents(120),
            stock_count: 2,
            is_available: true,
        },
        CatalogItem {
            id: CatalogItemId(9),
            name: "Cake".to_string(),
            price: Money::from_cents(400),
            stock_count: 3,
            is_available: false,
        },
    ]);
    let builder = OrderBuilder::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(clock.clone()),
    );
    let provider = MockCheckoutProvider::new();
    let checkout = CheckoutReconciler::new(
        hosted_checkout.then(|| {
            Arc::new(provider.clone()) as Arc<dyn CheckoutProvider>
        }),
        Arc::new(kv.clone()),
        builder.clone(),
        Arc::new(clock.clone()),
        CheckoutConfig::new("https://canteen.test"),
    );

    let mut state = AppState::new(access, builder, checkout);
    if let Some(token) = admin_token {
        state = state.with_admin_token(token);
    }

    Harness {
        app: router(state.clone()),
        state,
        store,
        provider,
        kv,
        clock,
    }
}

fn harness() -> Harness {
    harness_with(true, Some(ADMIN_TOKEN))
}

/// Same backends, but client addresses come from forwarding headers.
fn behind_proxy(mut h: Harness) -> Harness {
    h.state = h.state.with_trusted_proxy_headers(true);
    h.app = router(h.state.clone());
    h
}

/// Mark the request as arriving on a connection from `peer`.
fn from_peer(mut request: Request<Body>, peer: [u8; 4]) -> Request<Body> {
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((peer, 50000))));
    request
}

fn wrong_scan_forwarded_for(forwarded: &str) -> Request<Body> {
    let mut request = post_json("/api/scan-qr/", &json!({ "data": "wrong" }), None);
    request
        .headers_mut()
        .insert("x-forwarded-for", forwarded.parse().unwrap());
    request
}

fn post_json(uri: &str, body: &Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, headers, body)
}

/// `name=value` part of the response's Set-Cookie header.
fn cookie_pair(headers: &HeaderMap) -> String {
    headers
        .get(header::SET_COOKIE)
        .expect("Set-Cookie header should be present")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

fn location(headers: &HeaderMap) -> &str {
    headers.get(header::LOCATION).unwrap().to_str().unwrap()
}

async fn issue_code(h: &Harness, owner: &str) -> String {
    h.state
        .registry
        .issue(Some(owner.to_string()))
        .await
        .unwrap()
        .code
}

/// Scan a fresh pass and return the session cookie.
async fn sign_in(h: &Harness) -> String {
    let code = issue_code(h, "guest-1").await;
    let (status, headers, body) =
        send(&h.app, post_json("/api/scan-qr/", &json!({ "data": code }), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    cookie_pair(&headers)
}

// ============================================================================
// Health and middleware
// ============================================================================

#[tokio::test]
async fn health_returns_ok_with_request_id() {
    let h = harness();

    let response = h.app.clone().oneshot(get("/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
}

// ============================================================================
// Verification
// ============================================================================

#[tokio::test]
async fn valid_scan_sets_session_cookie_and_redirect() {
    let h = harness();
    let code = issue_code(&h, "guest-1").await;

    let (status, headers, body) =
        send(&h.app, post_json("/api/scan-qr/", &json!({ "data": code }), None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "QR Code Pass Valid");
    assert_eq!(body["redirect_url"], "/success/");

    let set_cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.starts_with("canteen_session="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
}

#[tokio::test]
async fn unknown_code_is_a_plain_no_match() {
    let h = harness();
    issue_code(&h, "guest-1").await;

    let (status, headers, body) = send(
        &h.app,
        post_json("/api/scan-qr/", &json!({ "data": "not-a-real-code" }), None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["valid"], false);
    assert_eq!(body["message"], "Invalid or expired QR code");
    assert!(body.get("redirect_url").is_none());
    assert!(!headers.contains_key(header::SET_COOKIE));
}

#[tokio::test]
async fn empty_and_oversized_codes_are_rejected() {
    let h = harness();

    let (status, _, body) =
        send(&h.app, post_json("/api/scan-qr/", &json!({ "data": "" }), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No QR data provided");

    let (status, _, body) =
        send(&h.app, post_json("/api/scan-qr/", &json!({}), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No QR data provided");

    let oversized = "x".repeat(1001);
    let (status, _, body) = send(
        &h.app,
        post_json("/api/scan-qr/", &json!({ "data": oversized }), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid QR code format");
}

#[tokio::test]
async fn malformed_body_is_a_bad_request() {
    let h = harness();
    let request = Request::builder()
        .method("POST")
        .uri("/api/scan-qr/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, _, body) = send(&h.app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid request format");
}

#[tokio::test]
async fn eleventh_attempt_in_window_is_rate_limited() {
    let h = harness();
    issue_code(&h, "guest-1").await;

    for _ in 0..10 {
        let (status, _, _) = send(
            &h.app,
            post_json("/api/scan-qr/", &json!({ "data": "wrong" }), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _, body) = send(
        &h.app,
        post_json("/api/scan-qr/", &json!({ "data": "wrong" }), None),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["message"], "Too many attempts. Please wait a minute.");

    // Another peer is unaffected.
    let request = from_peer(
        post_json("/api/scan-qr/", &json!({ "data": "wrong" }), None),
        [192, 0, 2, 50],
    );
    let (status, _, _) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn rotating_forwarded_for_does_not_reset_the_limit() {
    let h = harness();
    issue_code(&h, "guest-1").await;

    let mut statuses = Vec::new();
    for i in 0..15 {
        let request = from_peer(wrong_scan_forwarded_for(&format!("10.0.0.{i}")), [192, 0, 2, 7]);
        let (status, _, _) = send(&h.app, request).await;
        statuses.push(status);
    }

    assert!(statuses[..10].iter().all(|s| *s == StatusCode::OK));
    assert!(statuses[10..].iter().all(|s| *s == StatusCode::TOO_MANY_REQUESTS));
}

#[tokio::test]
async fn trusted_proxy_headers_separate_clients() {
    let h = behind_proxy(harness());
    issue_code(&h, "guest-1").await;

    for _ in 0..10 {
        let request = from_peer(wrong_scan_forwarded_for("203.0.113.1"), [10, 0, 0, 1]);
        send(&h.app, request).await;
    }
    let request = from_peer(wrong_scan_forwarded_for("203.0.113.1"), [10, 0, 0, 1]);
    let (status, _, _) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    // Same proxy connection, different client.
    let request = from_peer(wrong_scan_forwarded_for("203.0.113.9"), [10, 0, 0, 1]);
    let (status, _, _) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn malformed_bodies_count_against_the_limit() {
    let h = harness();
    let code = issue_code(&h, "guest-1").await;

    for _ in 0..10 {
        let request = Request::builder()
            .method("POST")
            .uri("/api/scan-qr/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, _, body) = send(&h.app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid request format");
    }

    let (status, headers, _) =
        send(&h.app, post_json("/api/scan-qr/", &json!({ "data": code }), None)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(!headers.contains_key(header::SET_COOKIE));
}

// ============================================================================
// Session
// ============================================================================

#[tokio::test]
async fn session_status_lists_available_menu_by_name() {
    let h = harness();
    let cookie = sign_in(&h).await;

    let (status, _, body) = send(&h.app, get("/api/session", Some(&cookie))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["owner_label"], "guest-1");
    assert_eq!(body["remaining_seconds"], 300);

    let names: Vec<&str> = body["menu"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Bread", "Soup"]);
    assert_eq!(body["menu"][1]["price"], "3.50");
}

#[tokio::test]
async fn expired_session_is_reported_then_forgotten() {
    let h = harness();
    let cookie = sign_in(&h).await;

    h.clock.advance(chrono::Duration::seconds(301));
    let (status, _, body) = send(&h.app, get("/api/session", Some(&cookie))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Session expired");

    h.clock.advance(chrono::Duration::seconds(600));
    let (status, _, body) = send(&h.app, get("/api/session", Some(&cookie))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Not authenticated");
}

#[tokio::test]
async fn logout_clears_session_and_redirects_home() {
    let h = harness();
    let cookie = sign_in(&h).await;

    let (status, headers, _) = send(&h.app, post_json("/logout", &json!({}), Some(&cookie))).await;

    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/");
    let cleared = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cleared.contains("Max-Age=0"));

    let (status, _, _) = send(&h.app, get("/api/session", Some(&cookie))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// ============================================================================
// Orders
// ============================================================================

#[tokio::test]
async fn order_without_session_is_forbidden() {
    let h = harness();

    let (status, _, body) = send(
        &h.app,
        post_json("/api/orders/", &json!({ "items": [{ "id": 7, "quantity": 1 }] }), None),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Not authenticated");
    assert!(h.store.orders().unwrap().is_empty());
}

#[tokio::test]
async fn in_person_order_totals_and_decrements_stock() {
    let h = harness();
    let cookie = sign_in(&h).await;

    let (status, _, body) = send(
        &h.app,
        post_json(
            "/api/orders/",
            &json!({ "items": [{ "id": 7, "quantity": 2 }], "payment_method": "in_person" }),
            Some(&cookie),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["total_amount"], "7.00");
    assert_eq!(
        h.store.item(CatalogItemId(7)).unwrap().unwrap().stock_count,
        3
    );

    let orders = h.store.orders().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].owner_label, "guest-1");
    assert_eq!(orders[0].payment_status, PaymentStatus::Pending);
}

#[tokio::test]
async fn cart_problems_carry_specific_messages() {
    let h = harness();
    let cookie = sign_in(&h).await;

    let cases = [
        (json!({ "items": [] }), "Cart is empty"),
        (
            json!({ "items": [{ "id": 7, "quantity": 0 }] }),
            "Invalid cart item",
        ),
        (
            json!({ "items": [{ "id": 7, "quantity": 1.5 }] }),
            "Invalid cart item",
        ),
        (
            json!({ "items": [{ "id": 7, "quantity": "2" }] }),
            "Invalid cart item",
        ),
        (
            json!({ "items": [{ "id": 7, "quantity": true }] }),
            "Invalid cart item",
        ),
        (
            json!({ "items": [{ "id": "seven", "quantity": 1 }] }),
            "Invalid cart item",
        ),
        (
            json!({ "items": [{ "id": 7.0, "quantity": 1 }] }),
            "Invalid cart item",
        ),
        (
            json!({ "items": [{ "id": 9, "quantity": 1 }] }),
            "Some items are unavailable",
        ),
        (
            json!({ "items": [{ "id": 8, "quantity": 3 }] }),
            "Insufficient stock for Bread",
        ),
        (
            json!({ "items": [{ "id": 7, "quantity": 1 }], "payment_method": "hosted_redirect" }),
            "Invalid payment method",
        ),
    ];

    for (request, message) in cases {
        let (status, _, body) =
            send(&h.app, post_json("/api/orders/", &request, Some(&cookie))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{request}");
        assert_eq!(body["message"], message, "{request}");
    }

    assert!(h.store.orders().unwrap().is_empty());
}

// ============================================================================
// Hosted checkout
// ============================================================================

#[tokio::test]
async fn paid_checkout_return_creates_order_once() {
    let h = harness();
    let cookie = sign_in(&h).await;

    let (status, _, body) = send(
        &h.app,
        post_json(
            "/api/checkout/",
            &json!({ "items": [{ "id": 7, "quantity": 2 }] }),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["checkout_url"].as_str().unwrap().contains("cs_test_1"));
    assert!(h.store.orders().unwrap().is_empty());

    h.provider.mark_paid("cs_test_1").unwrap();

    let (status, headers, _) = send(
        &h.app,
        get("/payments/checkout-success/?session_id=cs_test_1", None),
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert!(location(&headers).starts_with("/success/?payment=success&order_id="));

    let orders = h.store.orders().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].payment_status, PaymentStatus::Paid);

    // Replaying the return must not create a second order.
    let (_, headers, _) = send(
        &h.app,
        get("/payments/checkout-success/?session_id=cs_test_1", None),
    )
    .await;
    assert_eq!(location(&headers), "/payment-error/");
    assert_eq!(h.store.orders().unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_return_during_claim_lands_on_confirmation() {
    let h = harness();
    let cookie = sign_in(&h).await;
    send(
        &h.app,
        post_json(
            "/api/checkout/",
            &json!({ "items": [{ "id": 7, "quantity": 1 }] }),
            Some(&cookie),
        ),
    )
    .await;
    h.provider.mark_paid("cs_test_1").unwrap();

    let (_, first, _) = send(
        &h.app,
        get("/payments/checkout-success/?session_id=cs_test_1", None),
    )
    .await;
    let confirmation = location(&first).to_string();
    assert!(confirmation.starts_with("/success/?payment=success&order_id="));

    // A second tab's return still holds the claim.
    h.kv
        .incr(&format!("{CLAIM_PREFIX}cs_test_1"), Duration::from_secs(30))
        .await
        .unwrap();
    let (status, second, _) = send(
        &h.app,
        get("/payments/checkout-success/?session_id=cs_test_1", None),
    )
    .await;

    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&second), confirmation);
    assert_eq!(h.store.orders().unwrap().len(), 1);
}

#[tokio::test]
async fn unpaid_or_missing_checkout_ref_lands_on_payment_error() {
    let h = harness();
    let cookie = sign_in(&h).await;
    send(
        &h.app,
        post_json(
            "/api/checkout/",
            &json!({ "items": [{ "id": 7, "quantity": 1 }] }),
            Some(&cookie),
        ),
    )
    .await;

    let (_, headers, _) = send(
        &h.app,
        get("/payments/checkout-success/?session_id=cs_test_1", None),
    )
    .await;
    assert_eq!(location(&headers), "/payment-error/");

    let (_, headers, _) = send(&h.app, get("/payments/checkout-success/", None)).await;
    assert_eq!(location(&headers), "/payment-error/");

    let (status, _, body) = send(&h.app, get("/payment-error/", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(h.store.orders().unwrap().is_empty());
}

#[tokio::test]
async fn cancel_redirects_without_touching_stock() {
    let h = harness();

    let (status, headers, _) = send(&h.app, get("/payments/checkout-cancel/", None)).await;

    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/success/?payment=cancelled");
    assert_eq!(
        h.store.item(CatalogItemId(7)).unwrap().unwrap().stock_count,
        5
    );
}

#[tokio::test]
async fn checkout_without_provider_is_a_server_error() {
    let h = harness_with(false, None);
    let cookie = sign_in(&h).await;

    let (status, _, body) = send(
        &h.app,
        post_json(
            "/api/checkout/",
            &json!({ "items": [{ "id": 7, "quantity": 1 }] }),
            Some(&cookie),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "CHECKOUT_NOT_CONFIGURED");
}

// ============================================================================
// Admin
// ============================================================================

#[tokio::test]
async fn admin_routes_absent_without_token() {
    let h = harness_with(true, None);

    let (status, _, _) = send(&h.app, get("/admin/passes", None)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_rejects_wrong_bearer_token() {
    let h = harness();

    let request = Request::builder()
        .uri("/admin/passes")
        .header(header::AUTHORIZATION, "Bearer guess")
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(&h.app, get("/admin/passes", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_issues_pass_usable_for_scan() {
    let h = harness();

    let request = Request::builder()
        .method("POST")
        .uri("/admin/passes")
        .header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "owner_label": "  Table 4 " }).to_string()))
        .unwrap();
    let (status, headers, body) = send(&h.app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get(header::CACHE_CONTROL).unwrap(), "no-store");
    assert_eq!(body["pass"]["owner_label"], "Table 4");
    assert!(body["pass"].get("secret_hash").is_none());

    let code = body["code"].as_str().unwrap();
    let (_, _, scan) =
        send(&h.app, post_json("/api/scan-qr/", &json!({ "data": code }), None)).await;
    assert_eq!(scan["valid"], true);

    let request = Request::builder()
        .uri("/admin/passes?search=table")
        .header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"))
        .body(Body::empty())
        .unwrap();
    let (status, _, listed) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["use_count"], 1);
}

#[tokio::test]
async fn admin_summary_counts_paid_and_pending() {
    let h = harness();
    let cookie = sign_in(&h).await;
    send(
        &h.app,
        post_json(
            "/api/orders/",
            &json!({ "items": [{ "id": 8, "quantity": 1 }] }),
            Some(&cookie),
        ),
    )
    .await;

    let request = Request::builder()
        .uri("/admin/orders/summary")
        .header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"))
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&h.app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["paid_total"], "0.00");
    assert_eq!(body["paid_count"], 0);
    assert_eq!(body["pending_count"], 1);
}
