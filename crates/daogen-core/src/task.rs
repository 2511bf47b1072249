// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Suspension-based calls with callback delivery.
//!
//! [`launch`] runs a body on the background executor and reports the
//! outcome through a [`TransactionCallback`] on the dispatcher runtime.
//!
//! # Lifecycle
//!
//! 1. A [`CancellationHandle`] is created and handed to
//!    [`TransactionCallback::on_cancellable`] before anything is scheduled.
//! 2. The task starts on the dispatcher. If cancellation was requested by
//!    then, the body never runs and no further callback is made.
//! 3. The body runs on the blocking pool. The handle is disarmed once it
//!    returns, so a later cancel is a no-op.
//! 4. Exactly one of [`on_success`](TransactionCallback::on_success) or
//!    [`on_failure`](TransactionCallback::on_failure) is called. Failures
//!    carry [`TASK_FAILURE_CODE`] and the error message and are never
//!    propagated further.
//!
//! Cancellation during step 3 is cooperative: the body observes it at its
//! next checkpoint and reports a failure.

use std::sync::Arc;

use tracing::debug;

use crate::{
    cancel::{CancellationHandle, CancellationSignal},
    database::Database,
    error::DaoError
};

/// Code passed to [`TransactionCallback::on_failure`] for every failure.
pub const TASK_FAILURE_CODE: i32 = 404;

/// Receiver of a suspension-based call's lifecycle events.
pub trait TransactionCallback<T>: Send + Sync {
    /// Called once, before the call is scheduled.
    fn on_cancellable(&self, handle: CancellationHandle);

    /// Called with the result of a successful call.
    fn on_success(&self, value: T);

    /// Called when the call failed.
    fn on_failure(&self, code: i32, message: String);
}

/// Schedule `body` and report its outcome to `callback`.
///
/// With `in_transaction` the body runs inside
/// [`Database::run_in_transaction`].
pub fn launch<T, F>(
    db: &Arc<Database>,
    in_transaction: bool,
    callback: Arc<dyn TransactionCallback<T>>,
    body: F
) where
    T: Send + 'static,
    F: FnOnce(&CancellationSignal) -> Result<T, DaoError> + Send + 'static
{
    let signal = CancellationSignal::new();
    let handle = CancellationHandle::new({
        let signal = signal.clone();
        move || signal.cancel()
    });
    callback.on_cancellable(handle.clone());

    let dispatcher = match db.dispatcher() {
        Ok(dispatcher) => dispatcher,
        Err(err) => {
            handle.disarm();
            callback.on_failure(TASK_FAILURE_CODE, err.to_string());
            return;
        }
    };
    let executor = db.executor().unwrap_or_else(|_| dispatcher.clone());
    let db = Arc::clone(db);

    dispatcher.spawn(async move {
        if signal.is_cancelled() {
            debug!("suspended call cancelled before start");
            handle.disarm();
            return;
        }

        let task_signal = signal.clone();
        let outcome = executor
            .spawn_blocking(move || {
                task_signal.throw_if_cancelled()?;
                if in_transaction {
                    db.run_in_transaction(|| body(&task_signal))
                } else {
                    body(&task_signal)
                }
            })
            .await;
        handle.disarm();

        match outcome.map_err(DaoError::from).and_then(|result| result) {
            Ok(value) => callback.on_success(value),
            Err(err) => {
                debug!(error = %err, "suspended call failed");
                callback.on_failure(TASK_FAILURE_CODE, err.to_string());
            }
        }
    });
}
