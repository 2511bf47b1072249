// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Runtime error type shared by the engine and generated code.
//!
//! Errors are scoped to one call. The suspension adapter turns any of them
//! into a failure callback; futures and direct calls return them unchanged.

use thiserror::Error;

/// Alias for `Result<T, DaoError>`.
pub type DaoResult<T> = Result<T, DaoError>;

/// Errors raised while executing a generated data-access method.
#[derive(Debug, Error)]
pub enum DaoError {
    /// A single-result query matched no rows.
    #[error("query returned an empty result set but a single item was expected: {sql}")]
    MissingResult {
        /// SQL of the failed statement.
        sql: String
    },

    /// The operation observed a cancellation request.
    #[error("operation was cancelled")]
    Cancelled,

    /// The storage engine rejected the statement.
    #[error("storage engine error: {0}")]
    Engine(String),

    /// A write violated a unique or primary-key constraint.
    #[error("unique constraint failed: {0}")]
    UniqueConstraint(String),

    /// The result set has no column with this name.
    #[error("column `{0}` does not exist in the result set")]
    MissingColumn(String),

    /// A column value does not fit the requested type.
    #[error("column {index} holds {found}, expected {expected}")]
    TypeMismatch {
        /// Zero-based column index.
        index:    usize,
        /// Requested Rust type.
        expected: &'static str,
        /// Storage class found.
        found:    &'static str
    },

    /// A `NULL` column was read into a non-nullable type.
    #[error("column {0} is NULL but the target type is not nullable")]
    UnexpectedNull(usize),

    /// A column was read while the cursor was not on a row.
    #[error("cursor is not positioned on a row")]
    NoCurrentRow,

    /// The number of bound arguments does not match the statement.
    #[error("statement expects {expected} arguments but {actual} were bound")]
    ArgumentCount {
        /// Placeholders in the compiled statement.
        expected: usize,
        /// Arguments carried by the query.
        actual:   usize
    },

    /// No tokio runtime is configured or current.
    #[error("no background executor is available")]
    NoExecutor,

    /// An affected-row count does not fit the declared integer type.
    #[error("row count {count} does not fit `{target}`")]
    RowCountOverflow {
        /// Rows reported by the engine.
        count:  usize,
        /// Declared Rust type.
        target: &'static str
    },

    /// A background task panicked or was aborted.
    #[error("background task failed: {0}")]
    Task(String)
}

impl DaoError {
    /// Check if this is a missing single result.
    pub const fn is_missing_result(&self) -> bool {
        matches!(self, Self::MissingResult { .. })
    }

    /// Check if this is a cancellation.
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Check if this is a unique-constraint violation.
    pub const fn is_unique_constraint(&self) -> bool {
        matches!(self, Self::UniqueConstraint(_))
    }
}

/// Convert an affected-row count into the integer type a method declares.
///
/// # Example
///
/// ```rust
/// use daogen_core::{DaoError, row_count};
///
/// assert_eq!(row_count::<u8>(3)?, 3);
/// assert!(matches!(row_count::<u8>(300), Err(DaoError::RowCountOverflow { count: 300, .. })));
/// # Ok::<(), DaoError>(())
/// ```
pub fn row_count<T: TryFrom<usize>>(count: usize) -> Result<T, DaoError> {
    T::try_from(count).map_err(|_| DaoError::RowCountOverflow {
        count,
        target: std::any::type_name::<T>()
    })
}

impl From<tokio::task::JoinError> for DaoError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_cancelled() {
            Self::Cancelled
        } else {
            Self::Task(err.to_string())
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for DaoError {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ffi;

        match &err {
            rusqlite::Error::SqliteFailure(code, message)
                if code.code == rusqlite::ErrorCode::ConstraintViolation
                    && matches!(
                        code.extended_code,
                        ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE
                    ) =>
            {
                Self::UniqueConstraint(message.clone().unwrap_or_else(|| err.to_string()))
            }
            _ => Self::Engine(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_result_display_names_sql() {
        let err = DaoError::MissingResult {
            sql: "SELECT * FROM users".into()
        };
        assert!(err.is_missing_result());
        assert!(err.to_string().contains("SELECT * FROM users"));
    }

    #[test]
    fn predicates() {
        assert!(DaoError::Cancelled.is_cancelled());
        assert!(!DaoError::Cancelled.is_missing_result());
        assert!(DaoError::UniqueConstraint("x".into()).is_unique_constraint());
    }

    #[test]
    fn type_mismatch_display() {
        let err = DaoError::TypeMismatch {
            index:    2,
            expected: "i64",
            found:    "TEXT"
        };
        assert_eq!(err.to_string(), "column 2 holds TEXT, expected i64");
    }

    #[test]
    fn row_counts_convert_without_truncation() {
        assert_eq!(row_count::<u32>(7).unwrap(), 7);
        assert_eq!(row_count::<i64>(0).unwrap(), 0);
        let err = row_count::<i8>(200).unwrap_err();
        assert_eq!(err.to_string(), "row count 200 does not fit `i8`");
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn unique_violation_maps_to_dedicated_variant() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY); INSERT INTO t VALUES (1);")
            .unwrap();
        let err = conn.execute("INSERT INTO t VALUES (1)", []).unwrap_err();
        assert!(DaoError::from(err).is_unique_constraint());
    }
}
