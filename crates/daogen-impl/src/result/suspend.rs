// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Suspension delivery: the outcome is reported through the `callback`
//! parameter added to the method signature.

use proc_macro2::TokenStream;
use quote::quote;

use super::Work;
use crate::context::Context;

/// Name of the callback parameter.
pub const CALLBACK: &str = "callback";

/// Schedule `work` with `launch`, reporting to `callback`.
pub fn wrap(ctx: &Context<'_>, work: Work) -> TokenStream {
    let rt = &ctx.runtime;
    let callback = quote::format_ident!("{}", CALLBACK);
    let Work {
        setup,
        capture,
        body,
        value,
        in_transaction
    } = work;
    quote! {
        #setup
        #rt::launch(&self.__db, #in_transaction, #callback, {
            #capture
            move |_signal: &#rt::CancellationSignal| -> ::std::result::Result<#value, #rt::DaoError> {
                #body
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Options, model::InterfaceModel, result::capture_db};

    #[test]
    fn launch_receives_callback() {
        let model = InterfaceModel::new("Dao");
        let ctx = Context::new(&model, &Options::default());
        let code = wrap(&ctx, Work {
            setup: TokenStream::new(),
            capture: capture_db(),
            body: quote!(::std::result::Result::Ok(1)),
            value: quote!(i64),
            in_transaction: true
        })
        .to_string()
        .replace(' ', "");
        assert!(code.starts_with("::daogen_core::launch(&self.__db,true,callback,{"));
        assert!(code.ends_with("});"));
    }
}
