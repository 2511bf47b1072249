// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Cooperative cancellation.
//!
//! - [`CancellationSignal`] is the flag running work polls at checkpoints
//!   (before a statement executes and at every cursor step).
//! - [`CancellationHandle`] is the one-shot object handed to callers of
//!   suspension-based methods. It moves from active to cancelled exactly once
//!   and runs its action on that transition only.
//!
//! Neither preempts native I/O already in progress.

use std::{
    fmt,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering}
    }
};

use crate::error::DaoError;

/// Shared cancellation flag polled by running work.
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    cancelled: Arc<AtomicBool>
}

impl CancellationSignal {
    /// Create an active signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Return [`DaoError::Cancelled`] if cancellation was requested.
    pub fn throw_if_cancelled(&self) -> Result<(), DaoError> {
        if self.is_cancelled() {
            Err(DaoError::Cancelled)
        } else {
            Ok(())
        }
    }
}

type CancelAction = Box<dyn FnOnce() + Send>;

struct HandleInner {
    cancelled: AtomicBool,
    action:    Mutex<Option<CancelAction>>
}

/// One-shot, idempotent cancellation request.
///
/// Cloning shares the same state. The wrapped action runs at most once, on
/// the first [`cancel`](Self::cancel), and never after the owning task has
/// completed.
///
/// # Example
///
/// ```rust
/// use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
///
/// use daogen_core::CancellationHandle;
///
/// let calls = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&calls);
/// let handle = CancellationHandle::new(move || {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// handle.cancel();
/// handle.cancel();
/// assert_eq!(calls.load(Ordering::SeqCst), 1);
/// ```
#[derive(Clone)]
pub struct CancellationHandle {
    inner: Arc<HandleInner>
}

impl CancellationHandle {
    /// Wrap a cancellation action.
    pub fn new(action: impl FnOnce() + Send + 'static) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                cancelled: AtomicBool::new(false),
                action:    Mutex::new(Some(Box::new(action)))
            })
        }
    }

    /// Request cancellation. Only the first call has an effect.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        let action = self
            .inner
            .action
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(action) = action {
            action();
        }
    }

    /// Check whether [`cancel`](Self::cancel) was called.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Drop the action once the guarded work has finished.
    pub(crate) fn disarm(&self) {
        self.inner
            .action
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

impl fmt::Debug for CancellationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationHandle")
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    fn counting_handle() -> (CancellationHandle, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handle = CancellationHandle::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (handle, calls)
    }

    #[test]
    fn signal_starts_active() {
        let signal = CancellationSignal::new();
        assert!(!signal.is_cancelled());
        assert!(signal.throw_if_cancelled().is_ok());
    }

    #[test]
    fn signal_clones_share_state() {
        let signal = CancellationSignal::new();
        let other = signal.clone();
        other.cancel();
        assert!(signal.is_cancelled());
        assert!(signal.throw_if_cancelled().unwrap_err().is_cancelled());
    }

    #[test]
    fn handle_runs_action_once() {
        let (handle, calls) = counting_handle();
        handle.cancel();
        handle.cancel();
        handle.clone().cancel();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(handle.is_cancelled());
    }

    #[test]
    fn disarmed_handle_cancels_without_action() {
        let (handle, calls) = counting_handle();
        handle.disarm();
        handle.cancel();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(handle.is_cancelled());
    }
}
