// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Code assembler.
//!
//! Prints an [`ImplPlan`] as one implementation:
//!
//! ```rust,ignore
//! #[derive(Clone)]
//! pub struct UserDaoImpl {
//!     __db: Arc<Database>,
//!     __insertion_adapter_of_user: InsertAdapter<User>,
//!     // ... one field per shared helper
//! }
//!
//! impl UserDaoImpl {
//!     pub fn new(__db: Arc<Database>) -> Self { /* wires every helper */ }
//!     pub fn required_converters() -> &'static [&'static str] { /* ... */ }
//!     fn __entity_cursor_converter_user(_cursor: &Cursor) -> Result<User, DaoError> { /* ... */ }
//! }
//!
//! impl UserDao for UserDaoImpl { /* one method per declared method */ }
//! ```

use proc_macro2::TokenStream;
use quote::{ToTokens, format_ident, quote};

use crate::{
    context::Context,
    ir::ImplPlan,
    model::{Concurrency, Method},
    result::{suspend::CALLBACK, value_type}
};

/// External signature of `method`, without a body.
pub fn signature(ctx: &Context<'_>, method: &Method) -> TokenStream {
    let rt = &ctx.runtime;
    let name = &method.name;
    let value = value_type(method);
    let params = method.params.iter().map(|p| {
        let param = &p.name;
        let ty = &p.ty;
        quote!(#param: #ty)
    });
    match method.concurrency {
        Concurrency::Direct => quote! {
            fn #name(&self #(, #params)*) -> ::std::result::Result<#value, #rt::DaoError>
        },
        Concurrency::Future => quote! {
            fn #name(&self #(, #params)*) -> #rt::QueryFuture<#value>
        },
        Concurrency::Stream => quote! {
            fn #name(&self #(, #params)*) -> #rt::QueryStream<#value>
        },
        Concurrency::Suspend => {
            let callback = format_ident!("{}", CALLBACK);
            quote! {
                fn #name(
                    &self
                    #(, #params)*,
                    #callback: ::std::sync::Arc<dyn #rt::TransactionCallback<#value>>
                )
            }
        }
    }
}

impl ToTokens for ImplPlan {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let rt = &self.runtime;
        let trait_name = &self.trait_name;
        let impl_name = &self.impl_name;

        let field_names: Vec<_> = self.fields.iter().map(|f| &f.ident).collect();
        let field_types = self.fields.iter().map(|f| &f.ty);
        let field_inits = self.fields.iter().map(|f| {
            let ident = &f.ident;
            let init = &f.init;
            quote!(let #ident = #init;)
        });

        let constructor_doc = format!("Create a `{impl_name}` wiring every shared helper against the handle.");
        let constructor = match &self.backing_type {
            Some(backing) => quote! {
                #[doc = #constructor_doc]
                pub fn new(__backing: #backing) -> Self {
                    let __db: ::std::sync::Arc<#rt::Database> = ::std::convert::Into::into(__backing);
                    #(#field_inits)*
                    Self {
                        #(#field_names,)*
                        __db
                    }
                }
            },
            None => quote! {
                #[doc = #constructor_doc]
                pub fn new(__db: ::std::sync::Arc<#rt::Database>) -> Self {
                    #(#field_inits)*
                    Self {
                        #(#field_names,)*
                        __db
                    }
                }
            }
        };

        let converters = &self.converters;
        let row_adapters = self.row_adapters.iter().map(|row| {
            let ident = &row.ident;
            let entity = &row.entity;
            let body = &row.body;
            quote! {
                fn #ident(_cursor: &#rt::Cursor) -> ::std::result::Result<#entity, #rt::DaoError> {
                    #body
                }
            }
        });
        let methods = self.methods.iter().map(|m| {
            let signature = &m.signature;
            let body = &m.body;
            quote! {
                #signature {
                    #body
                }
            }
        });
        let struct_doc = format!("Generated implementation of [`{trait_name}`].");

        tokens.extend(quote! {
            #[doc = #struct_doc]
            #[derive(Clone)]
            pub struct #impl_name {
                __db: ::std::sync::Arc<#rt::Database>,
                #(#field_names: #field_types,)*
            }

            impl #impl_name {
                #constructor

                /// Custom converters used by this implementation, sorted.
                pub fn required_converters() -> &'static [&'static str] {
                    &[#(#converters),*]
                }

                #(#row_adapters)*
            }

            #[allow(unused_variables, unused_mut, clippy::needless_question_mark)]
            impl #trait_name for #impl_name {
                #(#methods)*
            }
        });
    }
}
