//! Scripted checkout provider for testing.

use crate::checkout::{
    CheckoutProvider, CheckoutSession, CheckoutSessionRequest, CheckoutSessionStatus,
    ProviderFuture, ProviderPaymentState,
};
use crate::error::{OrderError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// In-memory checkout provider.
///
/// Sessions are created unpaid with ids `cs_test_1`, `cs_test_2`, ...;
/// tests mark them paid with [`mark_paid`](Self::mark_paid).
#[derive(Debug, Clone, Default)]
pub struct MockCheckoutProvider {
    sessions: Arc<Mutex<HashMap<String, (CheckoutSessionRequest, ProviderPaymentState)>>>,
    next_id: Arc<AtomicU64>,
    failing: Arc<AtomicBool>,
}

impl MockCheckoutProvider {
    /// Create a provider with no sessions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<String, (CheckoutSessionRequest, ProviderPaymentState)>>>
    {
        self.sessions
            .lock()
            .map_err(|_| OrderError::Internal("Mutex lock failed".to_string()))
    }

    /// Mark a session as paid.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn mark_paid(&self, id: &str) -> Result<()> {
        if let Some(session) = self.lock()?.get_mut(id) {
            session.1 = ProviderPaymentState::Paid;
        }
        Ok(())
    }

    /// The request a session was created from.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn request(&self, id: &str) -> Result<Option<CheckoutSessionRequest>> {
        Ok(self.lock()?.get(id).map(|(request, _)| request.clone()))
    }

    /// Make every call fail as if the provider were down.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_up(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(OrderError::ProviderUnavailable("simulated outage".to_string()));
        }
        Ok(())
    }
}

impl CheckoutProvider for MockCheckoutProvider {
    fn create_session(&self, request: CheckoutSessionRequest) -> ProviderFuture<'_, CheckoutSession> {
        let result = self.check_up().and_then(|()| {
            let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            let id = format!("cs_test_{n}");
            self.lock()?
                .insert(id.clone(), (request, ProviderPaymentState::Unpaid));
            Ok(CheckoutSession {
                url: format!("https://checkout.test/pay/{id}"),
                id,
            })
        });
        Box::pin(async move { result })
    }

    fn retrieve_session(&self, id: String) -> ProviderFuture<'_, CheckoutSessionStatus> {
        let result = self.check_up().and_then(|()| {
            let sessions = self.lock()?;
            let (_, state) = sessions
                .get(&id)
                .ok_or_else(|| OrderError::ProviderUnavailable(format!("No such session: {id}")))?;
            Ok(CheckoutSessionStatus {
                id: id.clone(),
                payment_state: *state,
            })
        });
        Box::pin(async move { result })
    }
}
