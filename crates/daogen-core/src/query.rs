// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Bound statements.
//!
//! [`SqlQuery`] is SQL text plus its positional arguments. Placeholders are
//! `?`, indices start at 1. Statements with a runtime-sized `IN (...)` list
//! are assembled per call with [`append_placeholders`] so the slot count
//! always equals the size of the collection passed to that call.

use crate::value::{ToValue, Value};

/// SQL text with positional bindings.
///
/// # Example
///
/// ```rust
/// use daogen_core::{SqlQuery, Value, append_placeholders};
///
/// let ids = [3_i64, 5, 8];
/// let mut sql = String::from("SELECT * FROM users WHERE id IN (");
/// append_placeholders(&mut sql, ids.len());
/// sql.push(')');
///
/// let mut query = SqlQuery::acquire(sql, ids.len());
/// for (i, id) in ids.iter().enumerate() {
///     query.bind(i + 1, id);
/// }
/// assert_eq!(query.sql(), "SELECT * FROM users WHERE id IN (?,?,?)");
/// assert_eq!(query.bindings()[2], Value::Integer(8));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlQuery {
    sql:      String,
    bindings: Vec<Value>
}

impl SqlQuery {
    /// Create a statement expecting `arg_count` arguments, all `NULL`.
    pub fn acquire(sql: impl Into<String>, arg_count: usize) -> Self {
        Self {
            sql:      sql.into(),
            bindings: vec![Value::Null; arg_count]
        }
    }

    /// SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Number of argument slots.
    pub fn arg_count(&self) -> usize {
        self.bindings.len()
    }

    /// Bound arguments in slot order.
    pub fn bindings(&self) -> &[Value] {
        &self.bindings
    }

    /// Bind `value` at the 1-based `index`.
    ///
    /// Binding past the declared count grows the slot list; the engine
    /// rejects the statement at execution if the count then disagrees with
    /// the placeholders in the SQL.
    pub fn bind<V: ToValue + ?Sized>(&mut self, index: usize, value: &V) {
        self.bind_value(index, value.to_value());
    }

    /// Bind an already converted value at the 1-based `index`.
    pub fn bind_value(&mut self, index: usize, value: Value) {
        debug_assert!(index > 0, "statement arguments are 1-indexed");
        let Some(slot) = index.checked_sub(1) else {
            return;
        };
        if slot >= self.bindings.len() {
            self.bindings.resize(slot + 1, Value::Null);
        }
        self.bindings[slot] = value;
    }

    /// Bind `NULL` at the 1-based `index`.
    pub fn bind_null(&mut self, index: usize) {
        self.bind_value(index, Value::Null);
    }

    /// Reset every slot to `NULL` keeping the slot count.
    pub fn clear_bindings(&mut self) {
        self.bindings.fill(Value::Null);
    }
}

/// Append `count` comma-separated `?` placeholders.
///
/// Zero appends nothing, producing `IN ()`, which the engine evaluates as an
/// empty set.
pub fn append_placeholders(builder: &mut String, count: usize) {
    for i in 0..count {
        if i > 0 {
            builder.push(',');
        }
        builder.push('?');
    }
}
