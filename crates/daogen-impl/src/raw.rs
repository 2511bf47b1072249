// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Raw query binder: the statement is supplied by the caller.

use proc_macro2::TokenStream;
use quote::quote;
use tracing::warn;

use crate::{
    classify::{Raw, RawSource},
    context::Context,
    error::GenerateError,
    model::Method,
    result::{self, ReadRequest, Statement}
};

/// SQL of the statement generated when no query parameter is usable.
pub const MISSING_QUERY: &str = "missing query parameter";

/// Lower a raw query into a method body.
///
/// # Errors
///
/// Propagates row-adapter collisions.
pub fn lower(ctx: &mut Context<'_>, method: &Method, raw: &Raw<'_>) -> Result<TokenStream, GenerateError> {
    let rt = &ctx.runtime;
    let statement = match raw.source {
        RawSource::Literal(param) => {
            let name = &param.name;
            Statement::owned(quote!(let _statement = #rt::SqlQuery::acquire(#name, 0usize);))
        }
        RawSource::Owned(param) => {
            let name = &param.name;
            Statement::owned(quote!(let _statement = #name;))
        }
        RawSource::Borrowed(param) => {
            let name = &param.name;
            Statement::borrowed(quote!(#name))
        }
        RawSource::Fallback => {
            warn!(
                target: "daogen::raw_query",
                method = %method.name,
                "raw query has no statement parameter; generating a placeholder statement"
            );
            Statement::owned(quote!(let _statement = #rt::SqlQuery::acquire(#MISSING_QUERY, 0usize);))
        }
    };
    result::bind(ctx, method.concurrency, ReadRequest {
        statement,
        shape: &raw.shape,
        tables: &raw.tables,
        in_transaction: false
    })
}
