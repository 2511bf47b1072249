// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Result cursors.
//!
//! A [`Cursor`] owns the rows of one executed query. Its close hook runs
//! exactly once, either on [`Cursor::close`] or when the cursor is dropped,
//! so every exit path of generated code releases it.

use std::{collections::VecDeque, fmt};

use crate::{
    cancel::CancellationSignal,
    error::DaoError,
    value::{ConversionError, FromValue, Value}
};

type CloseHook = Box<dyn FnOnce() + Send>;

/// Forward-only cursor over a result set.
pub struct Cursor {
    columns:  Vec<String>,
    rows:     VecDeque<Vec<Value>>,
    total:    usize,
    current:  Option<Vec<Value>>,
    signal:   Option<CancellationSignal>,
    on_close: Option<CloseHook>,
    closed:   bool
}

impl Cursor {
    /// Create a cursor over materialized rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            total: rows.len(),
            rows: rows.into(),
            current: None,
            signal: None,
            on_close: None,
            closed: false
        }
    }

    /// Poll `signal` at every row step.
    #[must_use]
    pub fn with_signal(mut self, signal: Option<CancellationSignal>) -> Self {
        self.signal = signal;
        self
    }

    /// Run `hook` when the cursor is released.
    #[must_use]
    pub fn on_close(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_close = Some(Box::new(hook));
        self
    }

    /// Column names in result order.
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Total number of rows in the result set.
    pub fn count(&self) -> usize {
        self.total
    }

    /// Index of the column called `name`.
    ///
    /// Falls back to a match ignoring surrounding backticks so both
    /// `` `id` `` and `id` resolve.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .or_else(|| {
                let bare = name.trim_matches('`');
                self.columns
                    .iter()
                    .position(|c| c.trim_matches('`') == bare)
            })
    }

    /// Like [`column_index`](Self::column_index) but fails on absence.
    pub fn column_index_or_err(&self, name: &str) -> Result<usize, DaoError> {
        self.column_index(name)
            .ok_or_else(|| DaoError::MissingColumn(name.to_owned()))
    }

    /// Advance to the next row. Returns `false` past the last row.
    pub fn move_to_next(&mut self) -> Result<bool, DaoError> {
        if self.closed {
            return Ok(false);
        }
        if let Some(signal) = &self.signal {
            signal.throw_if_cancelled()?;
        }
        self.current = self.rows.pop_front();
        Ok(self.current.is_some())
    }

    /// Check whether the column at `index` of the current row is `NULL`.
    pub fn is_null(&self, index: usize) -> bool {
        self.current
            .as_ref()
            .and_then(|row| row.get(index))
            .is_none_or(Value::is_null)
    }

    /// Read the column at `index` of the current row.
    pub fn get<T: FromValue>(&self, index: usize) -> Result<T, DaoError> {
        let row = self.current.as_ref().ok_or(DaoError::NoCurrentRow)?;
        let value = row
            .get(index)
            .ok_or_else(|| DaoError::MissingColumn(format!("#{index}")))?;
        T::from_value(value).map_err(|err| match err {
            ConversionError::UnexpectedNull => DaoError::UnexpectedNull(index),
            ConversionError::Mismatch {
                expected,
                found
            } => DaoError::TypeMismatch {
                index,
                expected,
                found
            }
        })
    }

    /// Release the cursor. Further calls are no-ops.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.rows.clear();
        self.current = None;
        if let Some(hook) = self.on_close.take() {
            hook();
        }
    }

    /// Check whether the cursor was released.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("columns", &self.columns)
            .field("count", &self.total)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}
