// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Invalidation-aware query streams.
//!
//! A stream created by [`create_stream`] runs its query once right away and
//! again after every invalidation of a table the query reads.
//!
//! - The observer is registered when the stream is created, so writes that
//!   happen before the first poll are not missed.
//! - Invalidations that queue up while a query runs are coalesced into a
//!   single re-run.
//! - `Ok(None)` results are not emitted.
//! - The first error is emitted and ends the stream.
//! - Dropping the stream stops future re-runs; a run already in progress
//!   finishes on the blocking pool and its result is discarded.

use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};
use tracing::trace;

use crate::{database::Database, error::DaoError, invalidation::Observer};

/// Stream of query results, re-emitted on every invalidation.
pub type QueryStream<T> = BoxStream<'static, Result<T, DaoError>>;

struct Emitter<F> {
    db:             Arc<Database>,
    in_transaction: bool,
    observer:       Observer,
    callable:       Arc<F>,
    started:        bool,
    finished:       bool
}

/// Build a stream that re-runs `callable` whenever one of `tables` changes.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
///
/// use daogen_core::{Database, SqlQuery, SqliteEngine, create_stream};
/// use futures::StreamExt;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let engine = SqliteEngine::open_in_memory()?;
/// engine.execute_batch("CREATE TABLE t (v INTEGER)")?;
/// let db = Arc::new(Database::new(engine));
///
/// let reader = Arc::clone(&db);
/// let mut counts = create_stream(&db, false, &["t"], move || {
///     let mut cursor = reader.query(&SqlQuery::acquire("SELECT COUNT(*) FROM t", 0), None)?;
///     cursor.move_to_next()?;
///     cursor.get::<i64>(0).map(Some)
/// });
///
/// assert_eq!(counts.next().await.transpose()?, Some(0));
/// db.execute(&SqlQuery::acquire("INSERT INTO t VALUES (1)", 0))?;
/// assert_eq!(counts.next().await.transpose()?, Some(1));
/// # Ok::<(), daogen_core::DaoError>(())
/// # }).unwrap();
/// ```
pub fn create_stream<T, F>(
    db: &Arc<Database>,
    in_transaction: bool,
    tables: &[&str],
    callable: F
) -> QueryStream<T>
where
    T: Send + 'static,
    F: Fn() -> Result<Option<T>, DaoError> + Send + Sync + 'static
{
    let emitter = Emitter {
        db: Arc::clone(db),
        in_transaction,
        observer: db.invalidation_tracker().observe(tables),
        callable: Arc::new(callable),
        started: false,
        finished: false
    };

    stream::unfold(emitter, |mut emitter| async move {
        loop {
            if emitter.finished {
                return None;
            }
            if emitter.started {
                let tables = emitter.observer.changed().await?;
                trace!(tables = ?tables, "stream invalidated");
            } else {
                emitter.started = true;
            }

            let outcome = run_once(
                Arc::clone(&emitter.db),
                emitter.in_transaction,
                Arc::clone(&emitter.callable)
            )
            .await;
            match outcome {
                Ok(Some(value)) => return Some((Ok(value), emitter)),
                Ok(None) => continue,
                Err(err) => {
                    emitter.finished = true;
                    return Some((Err(err), emitter));
                }
            }
        }
    })
    .boxed()
}

async fn run_once<T, F>(
    db: Arc<Database>,
    in_transaction: bool,
    callable: Arc<F>
) -> Result<Option<T>, DaoError>
where
    T: Send + 'static,
    F: Fn() -> Result<Option<T>, DaoError> + Send + Sync + 'static
{
    let executor = db.executor()?;
    executor
        .spawn_blocking(move || {
            if in_transaction {
                db.run_in_transaction(|| callable())
            } else {
                callable()
            }
        })
        .await?
}
