// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Direct delivery: the work runs on the caller's thread.

use proc_macro2::TokenStream;
use quote::quote;

use super::Work;

/// Inline `work`, inside `run_in_transaction` when requested.
///
/// The body refers to the handle as `self.__db`; nothing is captured.
pub fn wrap(work: Work) -> TokenStream {
    let Work {
        setup,
        body,
        in_transaction,
        ..
    } = work;
    if in_transaction {
        quote! {
            #setup
            self.__db.run_in_transaction(|| {
                #body
            })
        }
    } else {
        quote! {
            #setup
            #body
        }
    }
}
