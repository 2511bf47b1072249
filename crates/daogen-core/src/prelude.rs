// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Convenient re-exports for common usage.
//!
//! # Usage
//!
//! ```rust
//! use daogen_core::prelude::*;
//! ```

#[cfg(feature = "sqlite")]
pub use crate::SqliteEngine;
pub use crate::{
    CancellationHandle, DaoError, DaoResult, Database, QueryFuture, QueryStream,
    TransactionCallback, TypeConverter
};
