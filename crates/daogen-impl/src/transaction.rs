// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Transaction binder: the user body runs inside `run_in_transaction` with
//! the implementation as its first argument.

use proc_macro2::TokenStream;
use quote::quote;

use crate::{
    context::Context,
    error::GenerateError,
    model::{Concurrency, Method},
    result::{self, Work}
};

/// Lower a transaction method calling `body`.
///
/// # Errors
///
/// Propagates unsupported delivery kinds.
pub fn lower(ctx: &Context<'_>, method: &Method, body: &syn::Path) -> Result<TokenStream, GenerateError> {
    let args = method.params.iter().map(|p| &p.name);
    let call = match method.concurrency {
        Concurrency::Direct => quote!(#body(self #(, #args)*)),
        _ => quote!(#body(&__this #(, #args)*))
    };
    result::deliver(ctx, method, "transaction", Work {
        setup: TokenStream::new(),
        capture: quote!(let __this = ::std::clone::Clone::clone(self);),
        body: call,
        value: result::value_type(method),
        in_transaction: true
    })
}

#[cfg(test)]
mod tests {
    use syn::parse_quote;

    use super::*;
    use crate::{
        Options,
        model::{InterfaceModel, MethodKind, Parameter}
    };

    fn method(concurrency: Concurrency) -> Method {
        Method::new("transfer", MethodKind::transaction(parse_quote!(crate::bodies::transfer)))
            .param(Parameter::new("from", parse_quote!(i64)))
            .param(Parameter::new("to", parse_quote!(i64)))
            .concurrency(concurrency)
    }

    #[test]
    fn direct_body_receives_self() {
        let model = InterfaceModel::new("Bank");
        let ctx = Context::new(&model, &Options::default());
        let m = method(Concurrency::Direct);
        let code = lower(&ctx, &m, &parse_quote!(crate::bodies::transfer))
            .unwrap()
            .to_string()
            .replace(' ', "");
        assert_eq!(
            code,
            "self.__db.run_in_transaction(||{crate::bodies::transfer(self,from,to)})"
        );
    }

    #[test]
    fn suspended_body_receives_clone() {
        let model = InterfaceModel::new("Bank");
        let ctx = Context::new(&model, &Options::default());
        let m = method(Concurrency::Suspend);
        let code = lower(&ctx, &m, &parse_quote!(crate::bodies::transfer))
            .unwrap()
            .to_string()
            .replace(' ', "");
        assert!(code.starts_with("::daogen_core::launch(&self.__db,true,callback,{let__this=::std::clone::Clone::clone(self);"));
        assert!(code.contains("crate::bodies::transfer(&__this,from,to)"));
    }

    #[test]
    fn streams_are_rejected() {
        let model = InterfaceModel::new("Bank");
        let ctx = Context::new(&model, &Options::default());
        let m = method(Concurrency::Stream);
        assert!(matches!(
            lower(&ctx, &m, &parse_quote!(crate::bodies::transfer)),
            Err(GenerateError::UnsupportedConcurrency { .. })
        ));
    }
}
