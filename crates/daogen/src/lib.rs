// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

//! # daogen
//!
//! One crate for both sides. Re-exports:
//! - the compiler from `daogen-impl` ([`generate`], [`generate_with`],
//!   [`plan`], [`model`])
//! - every runtime type from `daogen-core` ([`Database`], [`SqlQuery`],
//!   [`QueryFuture`], ...), also reachable as [`runtime`]
//!
//! # Quick Start
//!
//! ```rust,ignore
//! // build.rs
//! use daogen::model::{InterfaceModel, Method, MethodKind};
//!
//! let model = InterfaceModel::new("TagDao")
//!     .method(Method::new("clear", MethodKind::write("DELETE FROM tags")));
//! let tokens = daogen::generate(&model)?;
//! std::fs::write(out_dir.join("tag_dao.rs"), tokens.to_string())?;
//! ```

pub use daogen_core::*;
pub use daogen_core as runtime;
pub use daogen_impl::{GenerateError, ImplPlan, Options, generate, generate_with, model, plan};
