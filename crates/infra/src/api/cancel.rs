//! Cooperative cancellation for in-flight API calls

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Abort signal shared by every request issued while it is current.
///
/// Clones observe the same state. Aborting never affects a signal issued
/// later, so requests started after
/// [`ApiClient::clear_abort_signal`](super::ApiClient::clear_abort_signal)
/// run normally.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    token: CancellationToken,
}

impl AbortSignal {
    /// Fresh, un-aborted signal
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel every request bound to this signal
    pub fn abort(&self) {
        self.token.cancel();
    }

    /// Whether [`abort`](Self::abort) has been called
    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the signal is aborted
    pub fn aborted(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}
