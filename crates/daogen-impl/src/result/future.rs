// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Future delivery: the work runs on the blocking pool and the method
//! returns a cancelable `QueryFuture`.

use proc_macro2::TokenStream;
use quote::quote;

use super::Work;
use crate::context::Context;

/// Schedule `work` with `create_future`.
///
/// The closure receives the future's cancellation signal as `_signal`.
pub fn wrap(ctx: &Context<'_>, work: Work) -> TokenStream {
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
        #rt::create_future(&self.__db, #in_transaction, {
            #capture
            move |_signal: &#rt::CancellationSignal| -> ::std::result::Result<#value, #rt::DaoError> {
                #body
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Options, model::InterfaceModel, result::capture_db};

    #[test]
    fn closure_owns_captures() {
        let model = InterfaceModel::new("Dao");
        let ctx = Context::new(&model, &Options::default());
        let code = wrap(&ctx, Work {
            setup: TokenStream::new(),
            capture: capture_db(),
            body: quote!(__db.execute(&_statement).map(drop)),
            value: quote!(()),
            in_transaction: false
        })
        .to_string()
        .replace(' ', "");
        assert!(code.starts_with("::daogen_core::create_future(&self.__db,false,{let__db=::std::sync::Arc::clone(&self.__db);move|_signal:&::daogen_core::CancellationSignal|"));
        assert!(code.contains("->::std::result::Result<(),::daogen_core::DaoError>{__db.execute(&_statement).map(drop)}"));
    }
}
