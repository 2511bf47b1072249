// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Statements prepared once per generated implementation.
//!
//! A write whose placeholder count is fixed is held in a
//! [`SharedStatement`] field and leased on every call. The lease returns the
//! statement on drop. A second acquire while a lease is out gets a fresh
//! statement instead of waiting, so concurrent callers never share bindings.

use std::{
    fmt,
    ops::{Deref, DerefMut},
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering}
    }
};

use crate::query::SqlQuery;

struct SharedInner {
    sql:       String,
    arg_count: usize,
    leased:    AtomicBool,
    cached:    Mutex<Option<SqlQuery>>
}

/// A reusable statement with a fixed placeholder count.
///
/// # Example
///
/// ```rust
/// use daogen_core::SharedStatement;
///
/// let statement = SharedStatement::new("DELETE FROM users WHERE id = ?", 1);
/// let mut lease = statement.acquire();
/// lease.bind(1, &7_i64);
/// assert!(lease.is_shared());
///
/// let other = statement.acquire();
/// assert!(!other.is_shared());
/// ```
#[derive(Clone)]
pub struct SharedStatement {
    inner: Arc<SharedInner>
}

impl SharedStatement {
    /// Create a statement expecting `arg_count` arguments.
    pub fn new(sql: impl Into<String>, arg_count: usize) -> Self {
        Self {
            inner: Arc::new(SharedInner {
                sql: sql.into(),
                arg_count,
                leased: AtomicBool::new(false),
                cached: Mutex::new(None)
            })
        }
    }

    /// SQL text.
    pub fn sql(&self) -> &str {
        &self.inner.sql
    }

    /// Lease the statement with every slot reset to `NULL`.
    pub fn acquire(&self) -> StatementLease<'_> {
        if self
            .inner
            .leased
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return StatementLease {
                owner: None,
                query: self.new_query()
            };
        }
        let cached = self
            .inner
            .cached
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let query = match cached {
            Some(mut query) => {
                query.clear_bindings();
                query
            }
            None => self.new_query()
        };
        StatementLease {
            owner: Some(&self.inner),
            query
        }
    }

    /// An owned copy of the statement, for work moved to another thread.
    pub fn new_query(&self) -> SqlQuery {
        SqlQuery::acquire(self.inner.sql.clone(), self.inner.arg_count)
    }
}

impl fmt::Debug for SharedStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedStatement")
            .field("sql", &self.inner.sql)
            .field("arg_count", &self.inner.arg_count)
            .finish_non_exhaustive()
    }
}

/// Borrowed use of a [`SharedStatement`].
pub struct StatementLease<'a> {
    owner: Option<&'a SharedInner>,
    query: SqlQuery
}

impl StatementLease<'_> {
    /// Check whether this lease holds the shared instance.
    pub fn is_shared(&self) -> bool {
        self.owner.is_some()
    }
}

impl Deref for StatementLease<'_> {
    type Target = SqlQuery;

    fn deref(&self) -> &SqlQuery {
        &self.query
    }
}

impl DerefMut for StatementLease<'_> {
    fn deref_mut(&mut self) -> &mut SqlQuery {
        &mut self.query
    }
}

impl Drop for StatementLease<'_> {
    fn drop(&mut self) {
        if let Some(owner) = self.owner {
            *owner.cached.lock().unwrap_or_else(PoisonError::into_inner) =
                Some(std::mem::take(&mut self.query));
            owner.leased.store(false, Ordering::Release);
        }
    }
}
