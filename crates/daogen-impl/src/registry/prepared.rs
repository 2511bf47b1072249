// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Prepared write statements.

use quote::quote;
use syn::Ident;

use super::HelperRequest;
use crate::{context::Context, error::GenerateError, naming::snake};

/// Shared statement of the write method `method`.
///
/// Only templates with a fixed slot count may be prepared.
pub fn prepared_statement(
    ctx: &mut Context<'_>,
    method: &Ident,
    sql: &str,
    arg_count: usize
) -> Result<Ident, GenerateError> {
    let rt = &ctx.runtime;
    let ty = quote!(#rt::SharedStatement);
    let init = quote!(#rt::SharedStatement::new(#sql, #arg_count));
    ctx.registry.request(HelperRequest {
        key: format!("prepared:{method}"),
        fingerprint: format!("{sql}/{arg_count}"),
        name: format!("__prepared_stmt_of_{}", snake(method)),
        ty,
        init
    })
}
