// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Cancelable futures for background queries.
//!
//! [`create_future`] schedules a query on the blocking pool of the
//! database executor and returns a [`QueryFuture`] right away. The
//! cancellation signal exists before scheduling:
//!
//! - cancelled before the work starts: the work never runs;
//! - cancelled while it runs: the next checkpoint (statement start or
//!   cursor step) fails with [`DaoError::Cancelled`].
//!
//! Errors raised by the work come out of the future unchanged.

use std::{
    fmt,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll}
};

use tokio::task::JoinHandle;
use tracing::trace;

use crate::{cancel::CancellationSignal, database::Database, error::DaoError};

enum State<T> {
    Running(JoinHandle<Result<T, DaoError>>),
    Failed(Option<DaoError>)
}

/// Handle to a query running in the background.
///
/// Awaiting it yields the query result. Dropping it does not stop the
/// query; call [`cancel`](Self::cancel) for that.
#[must_use = "futures do nothing unless awaited or cancelled"]
pub struct QueryFuture<T> {
    state:  State<T>,
    signal: CancellationSignal
}

impl<T> QueryFuture<T> {
    fn failed(err: DaoError, signal: CancellationSignal) -> Self {
        Self {
            state: State::Failed(Some(err)),
            signal
        }
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.signal.cancel();
        if let State::Running(handle) = &self.state {
            handle.abort();
        }
    }

    /// Check whether [`cancel`](Self::cancel) was called.
    pub fn is_cancelled(&self) -> bool {
        self.signal.is_cancelled()
    }
}

impl<T> Future for QueryFuture<T> {
    type Output = Result<T, DaoError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.state {
            State::Running(handle) => Pin::new(handle)
                .poll(cx)
                .map(|joined| joined.map_err(DaoError::from).and_then(|result| result)),
            State::Failed(err) => Poll::Ready(Err(err
                .take()
                .unwrap_or_else(|| DaoError::Task("future polled after completion".into()))))
        }
    }
}

impl<T> fmt::Debug for QueryFuture<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryFuture")
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Run `callable` on the background executor.
///
/// With `in_transaction` the callable runs inside
/// [`Database::run_in_transaction`]. Without an executor the returned future
/// resolves to [`DaoError::NoExecutor`].
pub fn create_future<T, F>(db: &Arc<Database>, in_transaction: bool, callable: F) -> QueryFuture<T>
where
    T: Send + 'static,
    F: FnOnce(&CancellationSignal) -> Result<T, DaoError> + Send + 'static
{
    let signal = CancellationSignal::new();
    let executor = match db.executor() {
        Ok(executor) => executor,
        Err(err) => return QueryFuture::failed(err, signal)
    };

    let db = Arc::clone(db);
    let task_signal = signal.clone();
    let handle = executor.spawn_blocking(move || {
        task_signal.throw_if_cancelled()?;
        trace!(in_transaction, "background query started");
        if in_transaction {
            db.run_in_transaction(|| callable(&task_signal))
        } else {
            callable(&task_signal)
        }
    });

    QueryFuture {
        state: State::Running(handle),
        signal
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::{SqliteEngine, query::SqlQuery};

    fn db() -> Arc<Database> {
        Arc::new(Database::new(SqliteEngine::open_in_memory().unwrap()))
    }

    #[tokio::test]
    async fn resolves_with_callable_result() {
        let db = db();
        let future = create_future(&db, false, {
            let db = Arc::clone(&db);
            move |signal| {
                let mut cursor = db.query(&SqlQuery::acquire("SELECT 42", 0), Some(signal))?;
                cursor.move_to_next()?;
                cursor.get::<i64>(0)
            }
        });
        assert_eq!(future.await.unwrap(), 42);
    }

    #[tokio::test]
    async fn errors_propagate_unchanged() {
        let db = db();
        let future = create_future(&db, true, |_| -> Result<(), _> {
            Err(DaoError::MissingResult {
                sql: "SELECT".into()
            })
        });
        assert!(future.await.unwrap_err().is_missing_result());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancel_is_observed_at_next_checkpoint() {
        let db = db();
        let (go, wait) = std::sync::mpsc::channel::<()>();
        let future = create_future(&db, false, {
            let db = Arc::clone(&db);
            move |signal| {
                let _ = wait.recv();
                db.query(&SqlQuery::acquire("SELECT 1", 0), Some(signal))
                    .map(|cursor| cursor.count())
            }
        });
        future.cancel();
        go.send(()).ok();
        assert!(future.is_cancelled());
        assert!(future.await.unwrap_err().is_cancelled());
    }

    #[test]
    fn missing_executor_fails_the_future() {
        let db = db();
        let future = create_future(&db, false, |_| Ok(1));
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        assert!(matches!(
            runtime.block_on(future),
            Err(DaoError::NoExecutor)
        ));
    }
}
