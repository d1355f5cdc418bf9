//! Cooperative cancellation for render operations.
//!
//! A render is cancelled by the orchestrator when a newer render targets the
//! same surface. The provider may poll the token while it works; either way
//! the orchestrator discards the result of a cancelled render.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Cancellation token shared between the issuer of a render and the provider
/// performing it.
///
/// Clones observe the same state, so a provider running on a worker thread
/// sees a cancel issued from the viewer thread.
///
/// ```
/// use folio_scheduler::CancellationToken;
///
/// let token = CancellationToken::new();
/// let provider_side = token.clone();
///
/// token.cancel();
/// assert!(provider_side.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token in the non-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel this token and all of its clones. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Whether `other` is a clone of this token.
    pub fn same_as(&self, other: &CancellationToken) -> bool {
        Arc::ptr_eq(&self.cancelled, &other.cancelled)
    }
}
