//! HTTP request handlers, organized by surface.

pub mod access;
pub mod admin;
pub mod checkout;
pub mod health;
pub mod orders;

pub use health::health_check;
