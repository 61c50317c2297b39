//! HTTP client for a Stripe-compatible hosted checkout API.
//!
//! Only two calls are used: create a checkout session in `payment` mode and
//! retrieve it to read its `payment_status`.

use crate::checkout::{
    CheckoutProvider, CheckoutSession, CheckoutSessionRequest, CheckoutSessionStatus,
    ProviderFuture, ProviderPaymentState,
};
use crate::error::{OrderError, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// Default API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// Hosted checkout API client.
#[derive(Clone)]
pub struct HostedCheckoutClient {
    client: Client,
    secret_key: String,
    api_base: String,
}

impl std::fmt::Debug for HostedCheckoutClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedCheckoutClient")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct SessionResponse {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
}

impl HostedCheckoutClient {
    /// Create a client authenticating with `secret_key` against `api_base`.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Internal` if the HTTP client cannot be built.
    pub fn new(secret_key: String, api_base: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| OrderError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            secret_key,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    fn form(request: &CheckoutSessionRequest) -> Vec<(String, String)> {
        let mut form = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), request.success_url.clone()),
            ("cancel_url".to_string(), request.cancel_url.clone()),
            (
                "metadata[owner_label]".to_string(),
                request.owner_label.clone(),
            ),
        ];
        for (i, line) in request.line_items.iter().enumerate() {
            let prefix = format!("line_items[{i}]");
            form.push((
                format!("{prefix}[price_data][currency]"),
                request.currency.clone(),
            ));
            form.push((
                format!("{prefix}[price_data][product_data][name]"),
                line.name.clone(),
            ));
            form.push((
                format!("{prefix}[price_data][unit_amount]"),
                line.unit_amount.cents().to_string(),
            ));
            form.push((format!("{prefix}[quantity]"), line.quantity.to_string()));
        }
        form
    }

    async fn read(response: reqwest::Response) -> Result<SessionResponse> {
        match response.status() {
            StatusCode::OK => response
                .json::<SessionResponse>()
                .await
                .map_err(|e| OrderError::ProviderUnavailable(format!("Unreadable response: {e}"))),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(OrderError::ProviderUnavailable(format!(
                    "Provider returned {}: {body}",
                    status.as_u16()
                )))
            }
        }
    }

    async fn create(&self, request: CheckoutSessionRequest) -> Result<CheckoutSession> {
        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&Self::form(&request))
            .send()
            .await
            .map_err(|e| OrderError::ProviderUnavailable(e.to_string()))?;

        let session = Self::read(response).await?;
        let url = session.url.ok_or_else(|| {
            OrderError::ProviderUnavailable("Checkout session has no URL".to_string())
        })?;
        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }

    async fn retrieve(&self, id: String) -> Result<CheckoutSessionStatus> {
        let response = self
            .client
            .get(format!("{}/v1/checkout/sessions/{id}", self.api_base))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| OrderError::ProviderUnavailable(e.to_string()))?;

        let session = Self::read(response).await?;
        let payment_state = match session.payment_status.as_deref() {
            Some("paid") => ProviderPaymentState::Paid,
            Some("no_payment_required") => ProviderPaymentState::NoPaymentRequired,
            _ => ProviderPaymentState::Unpaid,
        };
        Ok(CheckoutSessionStatus {
            id: session.id,
            payment_state,
        })
    }
}

impl CheckoutProvider for HostedCheckoutClient {
    fn create_session(&self, request: CheckoutSessionRequest) -> ProviderFuture<'_, CheckoutSession> {
        Box::pin(self.create(request))
    }

    fn retrieve_session(&self, id: String) -> ProviderFuture<'_, CheckoutSessionStatus> {
        Box::pin(self.retrieve(id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::checkout::CheckoutLineItem;
    use canteen_core::Money;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> CheckoutSessionRequest {
        CheckoutSessionRequest {
            line_items: vec![CheckoutLineItem {
                name: "Soup".to_string(),
                unit_amount: Money::from_cents(350),
                quantity: 2,
            }],
            currency: "eur".to_string(),
            success_url: "https://canteen.test/ok?session_id={CHECKOUT_SESSION_ID}".to_string(),
            cancel_url: "https://canteen.test/cancel".to_string(),
            owner_label: "guest-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_session_sends_minor_units() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .and(header("authorization", "Bearer sk_test_123"))
            .and(body_string_contains("mode=payment"))
            .and(body_string_contains(
                "line_items%5B0%5D%5Bprice_data%5D%5Bunit_amount%5D=350",
            ))
            .and(body_string_contains("line_items%5B0%5D%5Bquantity%5D=2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "cs_test_1",
                "url": "https://checkout.test/pay/cs_test_1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = HostedCheckoutClient::new("sk_test_123".to_string(), &server.uri()).unwrap();
        let session = client.create_session(request()).await.unwrap();

        assert_eq!(session.id, "cs_test_1");
        assert_eq!(session.url, "https://checkout.test/pay/cs_test_1");
    }

    #[tokio::test]
    async fn test_retrieve_session_payment_state() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/checkout/sessions/cs_test_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "cs_test_1",
                "payment_status": "unpaid"
            })))
            .mount(&server)
            .await;

        let client = HostedCheckoutClient::new("sk".to_string(), &server.uri()).unwrap();
        let status = client.retrieve_session("cs_test_1".to_string()).await.unwrap();

        assert_eq!(status.payment_state, ProviderPaymentState::Unpaid);
    }

    #[tokio::test]
    async fn test_api_error_is_provider_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let client = HostedCheckoutClient::new("sk".to_string(), &server.uri()).unwrap();
        let err = client.create_session(request()).await.unwrap_err();

        assert!(matches!(err, OrderError::ProviderUnavailable(msg) if msg.contains("401")));
    }
}
