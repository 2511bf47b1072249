// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Entity shortcut binder.
//!
//! Every target gets the adapter matching the operation, shared with any
//! other method asking for the same entity, table and policy. The calls run
//! in one transaction so a failing target rolls back the earlier ones.
//!
//! | Operation | Single | Collection |
//! |-----------|--------|------------|
//! | insert | `insert` | `insert_all` |
//! | delete, update | `handle` | `handle_multiple` |
//! | upsert | `upsert` | `upsert_all` |

use proc_macro2::TokenStream;
use quote::quote;
use syn::Ident;

use crate::{
    classify::{Shortcut, ShortcutOp, ShortcutResult, Target},
    context::Context,
    error::GenerateError,
    model::{Concurrency, Method},
    registry,
    result::{self, Work}
};

/// Lower an entity shortcut into a method body.
///
/// # Errors
///
/// Propagates registry collisions and unsupported delivery kinds.
pub fn lower(
    ctx: &mut Context<'_>,
    method: &Method,
    shortcut: &Shortcut<'_>
) -> Result<TokenStream, GenerateError> {
    let mut adapters = Vec::with_capacity(shortcut.targets.len());
    for target in &shortcut.targets {
        adapters.push(adapter(ctx, shortcut.op, target)?);
    }

    let this = match method.concurrency {
        Concurrency::Direct => quote!(self),
        _ => quote!(__this)
    };
    let calls = shortcut.targets.iter().zip(&adapters).map(|(target, field)| {
        let param = &target.param.name;
        let (single, many) = operations(shortcut.op);
        if target.many {
            quote!(#this.#field.#many(#param.iter())?)
        } else {
            quote!(#this.#field.#single(&#param)?)
        }
    });

    let rt = &ctx.runtime;
    let body = match &shortcut.result {
        ShortcutResult::Unit => quote! {
            #(#calls;)*
            ::std::result::Result::Ok(())
        },
        ShortcutResult::Count(ty) => quote! {
            let mut _total: usize = 0;
            #(_total += #calls;)*
            #rt::row_count::<#ty>(_total)
        },
        ShortcutResult::RowId | ShortcutResult::RowIds => {
            let target = shortcut
                .targets
                .first()
                .zip(adapters.first())
                .map(|(target, field)| returning_call(shortcut.op, &this, target, field));
            quote! {
                let _result = #target?;
                ::std::result::Result::Ok(_result)
            }
        }
    };

    result::deliver(ctx, method, shortcut.op.tag(), Work {
        setup: TokenStream::new(),
        capture: quote!(let __this = ::std::clone::Clone::clone(self);),
        body,
        value: result::value_type(method),
        in_transaction: true
    })
}

fn adapter(ctx: &mut Context<'_>, op: ShortcutOp, target: &Target<'_>) -> Result<Ident, GenerateError> {
    match op {
        ShortcutOp::Insert(conflict) => registry::insertion(ctx, target.entity, target.table, conflict),
        ShortcutOp::Delete => registry::deletion(ctx, target.entity, target.table),
        ShortcutOp::Update(conflict) => registry::update(ctx, target.entity, target.table, conflict),
        ShortcutOp::Upsert => registry::upsertion(ctx, target.entity, target.table)
    }
}

fn operations(op: ShortcutOp) -> (Ident, Ident) {
    let (single, many) = match op {
        ShortcutOp::Insert(_) => ("insert", "insert_all"),
        ShortcutOp::Delete | ShortcutOp::Update(_) => ("handle", "handle_multiple"),
        ShortcutOp::Upsert => ("upsert", "upsert_all")
    };
    (crate::model::ident(single), crate::model::ident(many))
}

fn returning_call(op: ShortcutOp, this: &TokenStream, target: &Target<'_>, field: &Ident) -> TokenStream {
    let param = &target.param.name;
    let prefix = match op {
        ShortcutOp::Upsert => "upsert",
        _ => "insert"
    };
    if target.many {
        let call = quote::format_ident!("{prefix}_and_return_ids");
        quote!(#this.#field.#call(#param.iter()))
    } else {
        let call = quote::format_ident!("{prefix}_and_return_id");
        quote!(#this.#field.#call(&#param))
    }
}
