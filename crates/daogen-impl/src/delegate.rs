// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Delegating methods forward to another method of the same trait.

use proc_macro2::TokenStream;
use quote::quote;

use crate::{context::Context, model::Method};

/// Forward `method` to `target`, converting arguments and the result with
/// `Into`.
pub fn lower(ctx: &Context<'_>, method: &Method, target: &Method) -> TokenStream {
    let trait_name = ctx.trait_name;
    let name = &target.name;
    let args = method
        .params
        .iter()
        .map(|p| {
            let arg = &p.name;
            quote!(::std::convert::Into::into(#arg))
        });
    quote! {
        <Self as #trait_name>::#name(self #(, #args)*).map(::std::convert::Into::into)
    }
}

#[cfg(test)]
mod tests {
    use syn::parse_quote;

    use super::*;
    use crate::{
        Options,
        model::{InterfaceModel, MethodKind, Parameter}
    };

    #[test]
    fn arguments_and_result_are_converted() {
        let model = InterfaceModel::new("UserDao");
        let ctx = Context::new(&model, &Options::default());
        let target = Method::new("find", MethodKind::read("SELECT * FROM users WHERE id = ?"))
            .param(Parameter::new("id", parse_quote!(i64)))
            .returns(parse_quote!(User));
        let method = Method::new("find_small", MethodKind::delegate("find"))
            .param(Parameter::new("id", parse_quote!(i32)))
            .returns(parse_quote!(User));
        let code = lower(&ctx, &method, &target).to_string().replace(' ', "");
        assert_eq!(
            code,
            "<SelfasUserDao>::find(self,::std::convert::Into::into(id)).map(::std::convert::Into::into)"
        );
    }
}
