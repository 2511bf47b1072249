// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Stream delivery: the work re-runs whenever an observed table changes.

use proc_macro2::TokenStream;
use quote::quote;

use super::Work;
use crate::context::Context;

/// Re-run `work` with `create_stream` on every invalidation of `tables`.
///
/// The body must evaluate to `Result<Option<V>, DaoError>`; `Ok(None)` is
/// not emitted.
pub fn wrap(ctx: &Context<'_>, work: Work, tables: &[String]) -> TokenStream {
    let rt = &ctx.runtime;
    let Work {
        setup,
        capture,
        body,
        value,
        in_transaction
    } = work;
    quote! {
        #setup
        #rt::create_stream(&self.__db, #in_transaction, &[#(#tables),*], {
            #capture
            move || -> ::std::result::Result<::std::option::Option<#value>, #rt::DaoError> {
                #body
            }
        })
    }
}
