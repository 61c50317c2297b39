//! Custom Axum extractors.
//!
//! - `ClientIp`: rate-limit key, from the connection or trusted proxy headers
//! - `SessionCookie`: the caller's access session token, if any
//! - `ApiJson`: JSON body whose rejection is a generic 400
//! - `AdminAuth`: bearer token check for the admin routes

use crate::error::{AppError, INVALID_REQUEST_FORMAT};
use crate::state::{AppState, SESSION_COOKIE};
use axum::{
    Json, async_trait,
    extract::{ConnectInfo, FromRef, FromRequest, FromRequestParts, Request},
    http::{HeaderMap, header, request::Parts},
};
use canteen_auth::SessionToken;
use constant_time_eq::constant_time_eq;
use serde::de::DeserializeOwned;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Whether `X-Forwarded-For` / `X-Real-IP` may name the client.
///
/// Only enable behind a proxy that overwrites those headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrustProxyHeaders(pub bool);

impl FromRef<AppState> for TrustProxyHeaders {
    fn from_ref(state: &AppState) -> Self {
        Self(state.trust_proxy_headers)
    }
}

/// Client IP address.
///
/// # Priority
///
/// 1. `X-Forwarded-For` (first IP in the list), only with [`TrustProxyHeaders`]
/// 2. `X-Real-IP`, only with [`TrustProxyHeaders`]
/// 3. Connection IP (when served with connect info)
/// 4. `127.0.0.1`
#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub IpAddr);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    TrustProxyHeaders: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TrustProxyHeaders(trusted) = TrustProxyHeaders::from_ref(state);
        let connect_info = parts.extensions.get::<ConnectInfo<SocketAddr>>();
        let forwarded = if trusted {
            forwarded_client_ip(&parts.headers)
        } else {
            None
        };
        Ok(Self(forwarded.unwrap_or_else(|| {
            connect_info.map_or(IpAddr::V4(Ipv4Addr::LOCALHOST), |info| info.0.ip())
        })))
    }
}

fn forwarded_client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|ip| ip.trim().parse::<IpAddr>().ok())
        .or_else(|| {
            headers
                .get("X-Real-IP")
                .and_then(|v| v.to_str().ok())
                .and_then(|ip| ip.trim().parse::<IpAddr>().ok())
        })
}

/// The access session token from the `canteen_session` cookie.
///
/// Malformed values are treated as absent.
#[derive(Debug, Clone, Default)]
pub struct SessionCookie(pub Option<SessionToken>);

impl SessionCookie {
    /// Borrow the token.
    #[must_use]
    pub const fn token(&self) -> Option<&SessionToken> {
        self.0.as_ref()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionCookie
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .and_then(|(_, value)| SessionToken::parse(value));

        Ok(Self(token))
    }
}

/// JSON body extractor with a uniform 400 rejection.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "Rejected request body");
                Err(AppError::bad_request(INVALID_REQUEST_FORMAT))
            }
        }
    }
}

/// Proof that the request carries the admin bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AdminAuth;

#[async_trait]
impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.admin_token.as_deref() else {
            return Err(AppError::forbidden("Admin access is disabled"));
        };

        let presented = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        match presented {
            Some(token) if constant_time_eq(token.as_bytes(), expected.as_bytes()) => Ok(Self),
            _ => {
                tracing::warn!("Rejected admin request with missing or wrong token");
                Err(AppError::unauthorized("Invalid admin token"))
            }
        }
    }
}
