// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Database handle shared by generated implementations.
//!
//! [`Database`] owns the [`Engine`] and adds what the engine does not know
//! about:
//!
//! | Concern | Provided by |
//! |---------|-------------|
//! | Nestable transactions | [`Database::run_in_transaction`] |
//! | Invalidation fan-out | [`InvalidationTracker`] |
//! | Background executor | [`Database::executor`] |
//! | Callback dispatcher | [`Database::dispatcher`] |
//!
//! Tables written outside a transaction are published right after the
//! statement; tables written inside one are published when the outermost
//! transaction closes.

use std::fmt;

use tokio::runtime::Handle;
use tracing::{debug, trace};

use crate::{
    cancel::CancellationSignal, cursor::Cursor, engine::Engine, error::DaoError,
    invalidation::InvalidationTracker, query::SqlQuery, transaction::TransactionGuard
};

/// Shared database handle.
///
/// Generated implementations hold it as `Arc<Database>`; it is never
/// mutated after construction.
pub struct Database {
    engine:     Box<dyn Engine>,
    tracker:    InvalidationTracker,
    executor:   Option<Handle>,
    dispatcher: Option<Handle>
}

impl Database {
    /// Wrap `engine` with default executors.
    ///
    /// Asynchronous methods then run on the tokio runtime current at the
    /// call site.
    pub fn new(engine: impl Engine + 'static) -> Self {
        Self::builder(engine).build()
    }

    /// Start configuring a database over `engine`.
    pub fn builder(engine: impl Engine + 'static) -> DatabaseBuilder {
        DatabaseBuilder {
            engine:     Box::new(engine),
            executor:   None,
            dispatcher: None
        }
    }

    /// Underlying storage engine.
    pub fn engine(&self) -> &dyn Engine {
        self.engine.as_ref()
    }

    /// Invalidation tracker fed by writes through this handle.
    pub fn invalidation_tracker(&self) -> &InvalidationTracker {
        &self.tracker
    }

    /// Runtime used for background queries.
    ///
    /// Falls back to the runtime of the calling thread.
    pub fn executor(&self) -> Result<Handle, DaoError> {
        match &self.executor {
            Some(handle) => Ok(handle.clone()),
            None => Handle::try_current().map_err(|_| DaoError::NoExecutor)
        }
    }

    /// Runtime on which suspension-based methods deliver callbacks.
    ///
    /// Falls back to [`executor`](Self::executor).
    pub fn dispatcher(&self) -> Result<Handle, DaoError> {
        match &self.dispatcher {
            Some(handle) => Ok(handle.clone()),
            None => self.executor()
        }
    }

    /// Run a statement that returns rows.
    pub fn query(
        &self,
        query: &SqlQuery,
        signal: Option<&CancellationSignal>
    ) -> Result<Cursor, DaoError> {
        if let Some(signal) = signal {
            signal.throw_if_cancelled()?;
        }
        self.engine.query(query, signal)
    }

    /// Run a statement that returns no rows; yields the changed row count.
    pub fn execute(&self, query: &SqlQuery) -> Result<usize, DaoError> {
        self.execute_on(query, &[])
    }

    /// Run a statement that writes `tables`; yields the changed row count.
    ///
    /// `tables` are invalidated alongside whatever the engine tracked, so
    /// `DELETE FROM t` without a `WHERE` still reaches observers of `t`.
    pub fn execute_on(&self, query: &SqlQuery, tables: &[&str]) -> Result<usize, DaoError> {
        let changed = self.engine.execute(query)?;
        self.record(tables);
        Ok(changed)
    }

    /// Run an `INSERT`; yields the new row id or `-1`.
    pub fn execute_insert(&self, query: &SqlQuery) -> Result<i64, DaoError> {
        self.execute_insert_on(query, &[])
    }

    /// Run an `INSERT` into `tables`; yields the new row id or `-1`.
    pub fn execute_insert_on(&self, query: &SqlQuery, tables: &[&str]) -> Result<i64, DaoError> {
        let id = self.engine.execute_insert(query)?;
        self.record(tables);
        Ok(id)
    }

    /// Open a transaction. Prefer [`run_in_transaction`](Self::run_in_transaction).
    pub fn begin_transaction(&self) -> Result<(), DaoError> {
        self.engine.begin_transaction()
    }

    /// Close the innermost transaction.
    pub fn end_transaction(&self, success: bool) -> Result<(), DaoError> {
        self.engine.end_transaction(success)?;
        self.publish_outside_transaction();
        Ok(())
    }

    /// Check whether the calling thread has a transaction open.
    pub fn in_transaction(&self) -> bool {
        self.engine.in_transaction()
    }

    /// Run `body` inside a transaction.
    ///
    /// Commits when `body` returns `Ok`, rolls back on `Err` or panic. When
    /// the calling thread already has a transaction open, `body` runs in a
    /// savepoint of it; other threads wait until the outermost one closes.
    ///
    /// # Errors
    ///
    /// Returns the error of `body`, or the commit failure when `body`
    /// succeeded but the commit did not.
    pub fn run_in_transaction<T>(
        &self,
        body: impl FnOnce() -> Result<T, DaoError>
    ) -> Result<T, DaoError> {
        let guard = TransactionGuard::begin(self)?;
        match body() {
            Ok(value) => {
                guard.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = guard.rollback() {
                    debug!(error = %rollback, "rollback after failed body also failed");
                }
                Err(err)
            }
        }
    }

    fn record(&self, tables: &[&str]) {
        if !tables.is_empty() {
            self.engine.record_modified(tables);
        }
        self.publish_outside_transaction();
    }

    fn publish_outside_transaction(&self) {
        if self.engine.in_transaction() {
            return;
        }
        let tables = self.engine.take_modified_tables();
        if !tables.is_empty() {
            trace!(tables = ?tables, "publishing invalidations");
            self.tracker.notify(&tables);
        }
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("in_transaction", &self.in_transaction())
            .field("observers", &self.tracker.observer_count())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Database`].
///
/// # Example
///
/// ```rust
/// use daogen_core::{Database, SqliteEngine};
///
/// let runtime = tokio::runtime::Builder::new_multi_thread().build().unwrap();
/// let db = Database::builder(SqliteEngine::open_in_memory()?)
///     .executor(runtime.handle().clone())
///     .build();
/// assert!(db.executor().is_ok());
/// # Ok::<(), daogen_core::DaoError>(())
/// ```
pub struct DatabaseBuilder {
    engine:     Box<dyn Engine>,
    executor:   Option<Handle>,
    dispatcher: Option<Handle>
}

impl DatabaseBuilder {
    /// Runtime for background queries.
    #[must_use]
    pub fn executor(mut self, handle: Handle) -> Self {
        self.executor = Some(handle);
        self
    }

    /// Runtime for callback delivery of suspension-based methods.
    #[must_use]
    pub fn dispatcher(mut self, handle: Handle) -> Self {
        self.dispatcher = Some(handle);
        self
    }

    /// Finish the database.
    pub fn build(self) -> Database {
        debug!(
            executor = self.executor.is_some(),
            dispatcher = self.dispatcher.is_some(),
            "database ready"
        );
        Database {
            engine:     self.engine,
            tracker:    InvalidationTracker::new(),
            executor:   self.executor,
            dispatcher: self.dispatcher
        }
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use std::{sync::mpsc, thread, time::Duration};

    use super::*;
    use crate::SqliteEngine;

    fn db() -> Database {
        let engine = SqliteEngine::open_in_memory().unwrap();
        engine
            .execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)")
            .unwrap();
        Database::new(engine)
    }

    fn insert(db: &Database, id: i64) -> Result<i64, DaoError> {
        let mut query = SqlQuery::acquire("INSERT INTO users (id, name) VALUES (?, 'x')", 1);
        query.bind(1, &id);
        db.execute_insert(&query)
    }

    #[test]
    fn autocommit_write_publishes() {
        let db = db();
        let mut observer = db.invalidation_tracker().observe(["users"]);
        insert(&db, 1).unwrap();
        assert!(observer.drain());
    }

    #[test]
    fn transaction_publishes_on_outermost_commit() {
        let db = db();
        let mut observer = db.invalidation_tracker().observe(["users"]);
        db.run_in_transaction(|| {
            insert(&db, 1)?;
            db.run_in_transaction(|| insert(&db, 2))?;
            Ok(())
        })
        .unwrap();
        assert!(observer.drain());
    }

    #[test]
    fn failed_transaction_rolls_back_and_stays_quiet() {
        let db = db();
        let mut observer = db.invalidation_tracker().observe(["users"]);
        let result: Result<(), _> = db.run_in_transaction(|| {
            insert(&db, 1)?;
            Err(DaoError::Engine("boom".into()))
        });
        assert!(result.is_err());
        assert!(!observer.drain());
        assert!(!db.in_transaction());
    }

    #[test]
    fn concurrent_transaction_does_not_absorb_other_writes() {
        let db = db();
        let mut observer = db.invalidation_tracker().observe(["users"]);
        let (opened, wait_opened) = mpsc::channel();
        thread::scope(|scope| {
            let owner = &db;
            scope.spawn(move || {
                let result: Result<(), _> = owner.run_in_transaction(|| {
                    insert(owner, 1)?;
                    opened.send(()).unwrap();
                    thread::sleep(Duration::from_millis(50));
                    Err(DaoError::Engine("boom".into()))
                });
                assert!(result.is_err());
            });
            wait_opened.recv().unwrap();
            db.run_in_transaction(|| insert(&db, 2)).unwrap();
        });

        let mut cursor = db
            .query(&SqlQuery::acquire("SELECT id FROM users", 0), None)
            .unwrap();
        assert!(cursor.move_to_next().unwrap());
        assert_eq!(cursor.get::<i64>(0).unwrap(), 2);
        assert!(!cursor.move_to_next().unwrap());
        assert!(observer.drain());
    }

    #[test]
    fn delete_without_where_publishes_named_tables() {
        let db = db();
        insert(&db, 1).unwrap();
        let mut observer = db.invalidation_tracker().observe(["users"]);
        db.execute_on(&SqlQuery::acquire("DELETE FROM users", 0), &["users"])
            .unwrap();
        assert!(observer.drain());
    }

    #[test]
    fn named_tables_inside_a_transaction_wait_for_commit() {
        let db = db();
        let mut observer = db.invalidation_tracker().observe(["users"]);
        db.begin_transaction().unwrap();
        db.execute_on(&SqlQuery::acquire("DELETE FROM users", 0), &["users"])
            .unwrap();
        assert!(!observer.drain());
        db.end_transaction(true).unwrap();
        assert!(observer.drain());
    }

    #[test]
    fn cancelled_signal_blocks_query() {
        let db = db();
        let signal = CancellationSignal::new();
        signal.cancel();
        let err = db
            .query(&SqlQuery::acquire("SELECT * FROM users", 0), Some(&signal))
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn executor_without_runtime_is_an_error() {
        let db = db();
        assert!(matches!(db.executor(), Err(DaoError::NoExecutor)));
    }

    #[tokio::test]
    async fn executor_falls_back_to_current_runtime() {
        let db = db();
        assert!(db.executor().is_ok());
        assert!(db.dispatcher().is_ok());
    }
}
