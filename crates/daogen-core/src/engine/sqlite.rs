// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! SQLite engine backed by `rusqlite`.
//!
//! - Statements go through the connection's prepared-statement cache, so a
//!   statement with a fixed SQL text is compiled once and reused.
//! - A transaction is owned by the thread that opened it. Statements from
//!   other threads block until the outermost transaction closes; nested
//!   transactions of the owner map to savepoints.
//! - An update hook records every table a statement touches; the database
//!   handle drains that set to drive invalidation.
//!
//! The update hook does not fire for the truncate optimization
//! (`DELETE FROM t` without `WHERE`) or for rows replaced by
//! `ON CONFLICT REPLACE`. Callers that know the tables statically report
//! them through [`Engine::record_modified`].
//!
//! A transaction body must not wait on another thread that uses the same
//! engine; that thread blocks until the body returns.

use std::{
    collections::BTreeSet,
    mem,
    path::Path,
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    thread::{self, ThreadId}
};

use rusqlite::{
    Connection,
    types::{Value as SqliteValue, ValueRef}
};
use tracing::{debug, trace};

use super::Engine;
use crate::{
    cancel::CancellationSignal, cursor::Cursor, error::DaoError, query::SqlQuery, value::Value
};

struct Inner {
    conn:    Connection,
    depth:   usize,
    /// Thread running the open transaction.
    owner:   Option<ThreadId>,
    /// Tables written outside the open transaction, kept apart from its own.
    outside: BTreeSet<String>
}

impl Inner {
    fn foreign_owner(&self) -> bool {
        self.owner.is_some_and(|owner| owner != thread::current().id())
    }
}

/// [`Engine`] over a single SQLite connection.
///
/// # Example
///
/// ```rust
/// use daogen_core::{Database, SqliteEngine};
///
/// let engine = SqliteEngine::open_in_memory()?;
/// engine.execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL)")?;
/// let db = Database::new(engine);
/// assert!(!db.in_transaction());
/// # Ok::<(), daogen_core::DaoError>(())
/// ```
pub struct SqliteEngine {
    inner:    Mutex<Inner>,
    released: Condvar,
    modified: Arc<Mutex<BTreeSet<String>>>
}

impl SqliteEngine {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DaoError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening sqlite engine");
        Ok(Self::from_connection(Connection::open(path)?))
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, DaoError> {
        debug!("opening in-memory sqlite engine");
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    /// Wrap an existing connection and install change tracking on it.
    pub fn from_connection(conn: Connection) -> Self {
        let modified = Arc::new(Mutex::new(BTreeSet::new()));
        let sink = Arc::clone(&modified);
        conn.update_hook(Some(
            move |_action, _db: &str, table: &str, _rowid: i64| {
                sink.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(table.to_owned());
            }
        ));
        Self {
            inner:    Mutex::new(Inner {
                conn,
                depth:   0,
                owner:   None,
                outside: BTreeSet::new()
            }),
            released: Condvar::new(),
            modified
        }
    }

    /// Run one or more statements without arguments, for schema setup.
    pub fn execute_batch(&self, sql: &str) -> Result<(), DaoError> {
        self.lock().conn.execute_batch(sql)?;
        Ok(())
    }

    /// Lock the connection, waiting out a transaction of another thread.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.released
            .wait_while(self.lock_now(), |inner| inner.foreign_owner())
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_now(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn modified(&self) -> MutexGuard<'_, BTreeSet<String>> {
        self.modified.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn close_outermost(
        &self,
        mut inner: MutexGuard<'_, Inner>,
        success: bool
    ) -> Result<(), DaoError> {
        let mut outcome = Ok(());
        if success {
            outcome = inner.conn.execute_batch("COMMIT");
        }
        if success && outcome.is_ok() {
            let outside = mem::take(&mut inner.outside);
            self.modified().extend(outside);
        } else {
            // A failed COMMIT leaves the transaction open.
            let rolled_back = inner.conn.execute_batch("ROLLBACK");
            match (&outcome, rolled_back) {
                (Ok(()), result) => outcome = result,
                (Err(_), Err(err)) => {
                    debug!(error = %err, "rollback after failed commit also failed");
                }
                (Err(_), Ok(())) => {}
            }
            *self.modified() = mem::take(&mut inner.outside);
        }
        inner.owner = None;
        drop(inner);
        self.released.notify_all();
        outcome.map_err(DaoError::from)
    }
}

fn to_sqlite(value: &Value) -> SqliteValue {
    match value {
        Value::Null => SqliteValue::Null,
        Value::Integer(v) => SqliteValue::Integer(*v),
        Value::Real(v) => SqliteValue::Real(*v),
        Value::Text(v) => SqliteValue::Text(v.clone()),
        Value::Blob(v) => SqliteValue::Blob(v.clone())
    }
}

fn from_sqlite(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Integer(v),
        ValueRef::Real(v) => Value::Real(v),
        ValueRef::Text(v) => Value::Text(String::from_utf8_lossy(v).into_owned()),
        ValueRef::Blob(v) => Value::Blob(v.to_vec())
    }
}

fn bind_all(stmt: &mut rusqlite::Statement<'_>, query: &SqlQuery) -> Result<(), DaoError> {
    let expected = stmt.parameter_count();
    if expected != query.arg_count() {
        return Err(DaoError::ArgumentCount {
            expected,
            actual: query.arg_count()
        });
    }
    for (i, value) in query.bindings().iter().enumerate() {
        stmt.raw_bind_parameter(i + 1, to_sqlite(value))?;
    }
    Ok(())
}

impl Engine for SqliteEngine {
    fn execute(&self, query: &SqlQuery) -> Result<usize, DaoError> {
        trace!(sql = query.sql(), args = query.arg_count(), "execute");
        let inner = self.lock();
        let mut stmt = inner.conn.prepare_cached(query.sql())?;
        bind_all(&mut stmt, query)?;
        Ok(stmt.raw_execute()?)
    }

    fn execute_insert(&self, query: &SqlQuery) -> Result<i64, DaoError> {
        trace!(sql = query.sql(), args = query.arg_count(), "execute insert");
        let inner = self.lock();
        let mut stmt = inner.conn.prepare_cached(query.sql())?;
        bind_all(&mut stmt, query)?;
        let changed = stmt.raw_execute()?;
        if changed == 0 {
            Ok(-1)
        } else {
            Ok(inner.conn.last_insert_rowid())
        }
    }

    fn query(
        &self,
        query: &SqlQuery,
        signal: Option<&CancellationSignal>
    ) -> Result<Cursor, DaoError> {
        trace!(sql = query.sql(), args = query.arg_count(), "query");
        let inner = self.lock();
        let mut stmt = inner.conn.prepare_cached(query.sql())?;
        bind_all(&mut stmt, query)?;

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();
        let mut rows = Vec::new();
        let mut raw = stmt.raw_query();
        while let Some(row) = raw.next()? {
            if let Some(signal) = signal {
                signal.throw_if_cancelled()?;
            }
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(from_sqlite(row.get_ref(i)?));
            }
            rows.push(values);
        }

        Ok(Cursor::new(columns, rows).with_signal(signal.cloned()))
    }

    fn begin_transaction(&self) -> Result<(), DaoError> {
        let mut inner = self.lock();
        if inner.depth == 0 {
            inner.conn.execute_batch("BEGIN IMMEDIATE")?;
            inner.owner = Some(thread::current().id());
            inner.outside = mem::take(&mut *self.modified());
        } else {
            let savepoint = format!("SAVEPOINT daogen_sp_{}", inner.depth);
            inner.conn.execute_batch(&savepoint)?;
        }
        inner.depth += 1;
        debug!(depth = inner.depth, "transaction opened");
        Ok(())
    }

    fn end_transaction(&self, success: bool) -> Result<(), DaoError> {
        let mut inner = self.lock();
        let Some(depth) = inner.depth.checked_sub(1) else {
            return Err(DaoError::Engine("no transaction is open".into()));
        };
        inner.depth = depth;
        match (depth, success) {
            (0, _) => self.close_outermost(inner, success)?,
            (n, true) => inner
                .conn
                .execute_batch(&format!("RELEASE SAVEPOINT daogen_sp_{n}"))?,
            (n, false) => inner.conn.execute_batch(&format!(
                "ROLLBACK TO SAVEPOINT daogen_sp_{n}; RELEASE SAVEPOINT daogen_sp_{n}"
            ))?
        }
        debug!(depth, success, "transaction closed");
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.lock_now().owner == Some(thread::current().id())
    }

    fn record_modified(&self, tables: &[&str]) {
        let mut inner = self.lock_now();
        let names = tables.iter().map(|&table| table.to_owned());
        if inner.foreign_owner() {
            inner.outside.extend(names);
        } else {
            self.modified().extend(names);
        }
    }

    fn take_modified_tables(&self) -> Vec<String> {
        let mut inner = self.lock_now();
        if inner.foreign_owner() {
            mem::take(&mut inner.outside).into_iter().collect()
        } else {
            mem::take(&mut *self.modified()).into_iter().collect()
        }
    }
}
