// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Storage engine boundary.
//!
//! The engine compiles and runs statements; this crate never parses SQL.
//! [`Database`](crate::Database) wraps an engine and adds transactions,
//! invalidation fan-out and executors on top of it.
//!
//! # Implementations
//!
//! | Engine | Feature |
//! |--------|---------|
//! | [`SqliteEngine`](sqlite::SqliteEngine) | `sqlite` (default) |

#[cfg(feature = "sqlite")]
pub mod sqlite;

use crate::{cancel::CancellationSignal, cursor::Cursor, error::DaoError, query::SqlQuery};

/// A statement-oriented storage engine.
///
/// Implementations must be usable from several threads; statement handles
/// are serialized inside the engine. A transaction belongs to the thread
/// that opened it: statements from other threads wait until the outermost
/// transaction closes, and only the owning thread nests savepoints.
pub trait Engine: Send + Sync {
    /// Run a statement that returns no rows, yielding the changed row count.
    fn execute(&self, query: &SqlQuery) -> Result<usize, DaoError>;

    /// Run an `INSERT`, yielding the new row id, or `-1` when no row was
    /// inserted (for example under `OR IGNORE`).
    fn execute_insert(&self, query: &SqlQuery) -> Result<i64, DaoError>;

    /// Run a statement that returns rows.
    ///
    /// When `signal` is set the engine polls it between rows and the
    /// returned cursor keeps polling it.
    fn query(
        &self,
        query: &SqlQuery,
        signal: Option<&CancellationSignal>
    ) -> Result<Cursor, DaoError>;

    /// Open a transaction, nesting inside an open one.
    fn begin_transaction(&self) -> Result<(), DaoError>;

    /// Close the innermost transaction, committing when `success` is set.
    fn end_transaction(&self, success: bool) -> Result<(), DaoError>;

    /// Check whether the calling thread has a transaction open.
    fn in_transaction(&self) -> bool;

    /// Mark `tables` as written by the last statement.
    ///
    /// Covers writes the engine's own tracking misses. The names are
    /// returned by the next [`take_modified_tables`](Self::take_modified_tables)
    /// that follows the outermost commit, and dropped on rollback. Engines
    /// without change tracking ignore them.
    fn record_modified(&self, _tables: &[&str]) {}

    /// Drain the names of tables written since the last call.
    ///
    /// Engines without change tracking return nothing and rely on callers
    /// notifying the tracker directly.
    fn take_modified_tables(&self) -> Vec<String> {
        Vec::new()
    }
}
