// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cooperative cancellation token accepted by every async entry point.

use std::future::Future;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use agentkit_error::{AgentkitError, Result};
use tokio::sync::Notify;

/// Cooperative cancellation token.
///
/// Cloneable and backed by an `Arc`; calling [`cancel`](CancelToken::cancel)
/// on any clone signals all waiters.
#[derive(Clone)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancelToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Signal cancellation to all waiters.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Returns `true` if cancellation has been signalled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Wait until cancellation is signalled (returns immediately if already cancelled).
    pub async fn cancelled(&self) {
        let notified = self.notify.notified();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }

    /// Fail fast with `OPERATION_CANCELLED` if the token has fired.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(AgentkitError::cancelled())
        } else {
            Ok(())
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Race `fut` against `token`.
///
/// Returns `OPERATION_CANCELLED` if the token fires first; the future is
/// dropped at that point.
pub async fn run_cancellable<F, T>(token: &CancelToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    token.check()?;
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(AgentkitError::cancelled()),
        out = fut => out,
    }
}
