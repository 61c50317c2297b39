//! Axum HTTP surface for Canteen.
//!
//! Handlers stay thin: parse the request into an explicit struct, call one
//! service from [`AppState`], and map the result. All policy about what a
//! caller may learn from a failure lives in [`AppError`]'s conversions.
//!
//! # Request Flow
//!
//! 1. **HTTP Request** arrives with a request id and tracing span
//! 2. **Extract** client IP, session cookie and JSON body
//! 3. **Call** the verifier, session guard, order builder or reconciler
//! 4. **Map** the result (or [`AppError`]) to a response
//!
//! # Example
//!
//! ```ignore
//! use canteen_web::{AppState, router};
//!
//! let state = AppState::new(access, orders, checkout).with_admin_token(token);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, router(state)).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::AppError;
pub use extractors::{AdminAuth, ApiJson, ClientIp, SessionCookie, TrustProxyHeaders};
pub use middleware::{REQUEST_ID_HEADER, with_observability};
pub use router::router;
pub use state::{AppState, CookieSettings, SESSION_COOKIE};
