// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Runtime support for daogen generated data-access implementations.
//!
//! Generated code calls into this crate for everything that happens at run
//! time; it can also be used directly to hand-write an implementation.
//!
//! # Overview
//!
//! | Area | Types |
//! |------|-------|
//! | Values | [`Value`], [`ToValue`], [`FromValue`], [`TypeConverter`] |
//! | Statements | [`SqlQuery`], [`append_placeholders`], [`SharedStatement`] |
//! | Results | [`Cursor`] |
//! | Storage | [`Engine`], [`SqliteEngine`], [`Database`], [`TransactionGuard`] |
//! | Invalidation | [`InvalidationTracker`], [`Observer`] |
//! | Shortcut writes | [`InsertAdapter`], [`DeleteOrUpdateAdapter`], [`UpsertAdapter`] |
//! | Concurrency | [`QueryFuture`], [`QueryStream`], [`launch`], [`CancellationHandle`] |
//! | Errors | [`DaoError`] |
//!
//! # Example
//!
//! ```rust
//! use daogen_core::{Database, SqlQuery, SqliteEngine};
//!
//! let engine = SqliteEngine::open_in_memory()?;
//! engine.execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)")?;
//! let db = Database::new(engine);
//!
//! let mut insert = SqlQuery::acquire("INSERT INTO users (name) VALUES (?)", 1);
//! insert.bind(1, "ada");
//! assert_eq!(db.execute_insert(&insert)?, 1);
//!
//! let mut cursor = db.query(&SqlQuery::acquire("SELECT name FROM users", 0), None)?;
//! assert!(cursor.move_to_next()?);
//! assert_eq!(cursor.get::<String>(0)?, "ada");
//! # Ok::<(), daogen_core::DaoError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod prelude;

mod adapter;
mod cancel;
mod cursor;
mod database;
mod engine;
mod error;
mod future;
mod invalidation;
mod query;
mod shared;
mod stream;
mod task;
mod transaction;
mod value;

pub use adapter::{Binder, DeleteOrUpdateAdapter, InsertAdapter, UpsertAdapter};
pub use cancel::{CancellationHandle, CancellationSignal};
pub use cursor::Cursor;
pub use database::{Database, DatabaseBuilder};
pub use engine::Engine;
#[cfg(feature = "sqlite")]
#[cfg_attr(docsrs, doc(cfg(feature = "sqlite")))]
pub use engine::sqlite::SqliteEngine;
pub use error::{DaoError, DaoResult, row_count};
pub use future::{QueryFuture, create_future};
pub use invalidation::{InvalidationTracker, Observer};
pub use query::{SqlQuery, append_placeholders};
pub use shared::{SharedStatement, StatementLease};
pub use stream::{QueryStream, create_stream};
pub use task::{TASK_FAILURE_CODE, TransactionCallback, launch};
pub use transaction::TransactionGuard;
pub use value::{ConversionError, FromValue, ToValue, TypeConverter, Value};
