// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Scoped transactions.
//!
//! [`TransactionGuard`] opens a transaction on creation and must be closed
//! with [`commit`](TransactionGuard::commit) or
//! [`rollback`](TransactionGuard::rollback). A guard dropped without either
//! (an early return or a panic in the body) rolls back.
//!
//! Guards nest: an inner guard maps to a savepoint of the outer one, so
//! generated transaction methods that call other generated methods observe
//! the same transactional context.

use tracing::warn;

use crate::{database::Database, error::DaoError};

/// Open transaction bound to a [`Database`].
///
/// # Example
///
/// ```rust
/// use daogen_core::{Database, SqliteEngine, SqlQuery, TransactionGuard};
///
/// let engine = SqliteEngine::open_in_memory()?;
/// engine.execute_batch("CREATE TABLE t (v INTEGER)")?;
/// let db = Database::new(engine);
///
/// let guard = TransactionGuard::begin(&db)?;
/// db.execute(&SqlQuery::acquire("INSERT INTO t VALUES (1)", 0))?;
/// guard.rollback()?;
///
/// let mut cursor = db.query(&SqlQuery::acquire("SELECT COUNT(*) FROM t", 0), None)?;
/// cursor.move_to_next()?;
/// assert_eq!(cursor.get::<i64>(0)?, 0);
/// # Ok::<(), daogen_core::DaoError>(())
/// ```
#[must_use = "a dropped guard rolls the transaction back"]
pub struct TransactionGuard<'a> {
    db:       &'a Database,
    finished: bool
}

impl<'a> TransactionGuard<'a> {
    /// Open a transaction, or a savepoint inside an open one.
    pub fn begin(db: &'a Database) -> Result<Self, DaoError> {
        db.begin_transaction()?;
        Ok(Self {
            db,
            finished: false
        })
    }

    /// Commit the work done under this guard.
    pub fn commit(mut self) -> Result<(), DaoError> {
        self.finished = true;
        self.db.end_transaction(true)
    }

    /// Discard the work done under this guard.
    pub fn rollback(mut self) -> Result<(), DaoError> {
        self.finished = true;
        self.db.end_transaction(false)
    }

    /// Commit on `true`, roll back on `false`.
    pub fn finish(self, success: bool) -> Result<(), DaoError> {
        if success { self.commit() } else { self.rollback() }
    }
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        warn!("transaction guard dropped while open, rolling back");
        if let Err(err) = self.db.end_transaction(false) {
            warn!(error = %err, "rollback of abandoned transaction failed");
        }
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::{SqliteEngine, query::SqlQuery};

    fn db() -> Database {
        let engine = SqliteEngine::open_in_memory().unwrap();
        engine.execute_batch("CREATE TABLE t (v INTEGER)").unwrap();
        Database::new(engine)
    }

    fn count(db: &Database) -> i64 {
        let mut cursor = db
            .query(&SqlQuery::acquire("SELECT COUNT(*) FROM t", 0), None)
            .unwrap();
        cursor.move_to_next().unwrap();
        cursor.get(0).unwrap()
    }

    fn insert(db: &Database) {
        db.execute(&SqlQuery::acquire("INSERT INTO t VALUES (1)", 0))
            .unwrap();
    }

    #[test]
    fn commit_keeps_rows() {
        let db = db();
        let guard = TransactionGuard::begin(&db).unwrap();
        insert(&db);
        guard.commit().unwrap();
        assert_eq!(count(&db), 1);
        assert!(!db.in_transaction());
    }

    #[test]
    fn drop_rolls_back() {
        let db = db();
        {
            let _guard = TransactionGuard::begin(&db).unwrap();
            insert(&db);
        }
        assert_eq!(count(&db), 0);
        assert!(!db.in_transaction());
    }

    #[test]
    fn inner_rollback_keeps_outer() {
        let db = db();
        let outer = TransactionGuard::begin(&db).unwrap();
        insert(&db);
        let inner = TransactionGuard::begin(&db).unwrap();
        insert(&db);
        inner.finish(false).unwrap();
        outer.finish(true).unwrap();
        assert_eq!(count(&db), 1);
    }
}
