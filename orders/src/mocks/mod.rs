//! Mock provider implementations for testing.

pub mod checkout;
pub mod store;

pub use checkout::MockCheckoutProvider;
pub use store::InMemoryOrderStore;
