// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Row adapters.
//!
//! One associated function per entity converts the current cursor row:
//!
//! ```text
//! fn __entity_cursor_converter_user(_cursor: &Cursor) -> Result<User, DaoError> {
//!     let _index_of_id = _cursor.column_index_or_err("id")?;
//!     let _index_of_name = _cursor.column_index_or_err("name")?;
//!     Ok(User { id: _cursor.get(_index_of_id)?, name: _cursor.get(_index_of_name)? })
//! }
//! ```

use proc_macro2::TokenStream;
use quote::quote;
use syn::Ident;

use crate::{
    context::Context,
    error::GenerateError,
    ir::RowAdapterDecl,
    model::{Entity, Field},
    naming
};

fn read_field(ctx: &Context<'_>, field: &Field) -> TokenStream {
    let rt = &ctx.runtime;
    let index = naming::column_index(&field.name);
    match (&field.converter, field.nullable) {
        (None, _) => quote!(_cursor.get(#index)?),
        (Some(converter), false) => quote! {
            <#converter as #rt::TypeConverter>::from_column(_cursor.get(#index)?)
        },
        (Some(converter), true) => quote! {
            if _cursor.is_null(#index) {
                ::std::option::Option::None
            } else {
                ::std::option::Option::Some(
                    <#converter as #rt::TypeConverter>::from_column(_cursor.get(#index)?)
                )
            }
        }
    }
}

fn body(ctx: &Context<'_>, entity: &Entity) -> TokenStream {
    let name = &entity.name;
    let lookups = entity.fields.iter().map(|field| {
        let index = naming::column_index(&field.name);
        let column = &field.column;
        quote!(let #index = _cursor.column_index_or_err(#column)?;)
    });
    let inits = entity.fields.iter().map(|field| {
        let field_name = &field.name;
        let read = read_field(ctx, field);
        quote!(#field_name: #read)
    });
    quote! {
        #(#lookups)*
        ::std::result::Result::Ok(#name {
            #(#inits),*
        })
    }
}

/// Row adapter function of `entity`, declared on first use.
///
/// # Errors
///
/// [`GenerateError::HelperCollision`] when another entity with the same
/// name but different columns already has an adapter.
pub fn row_adapter(ctx: &mut Context<'_>, entity: &Entity) -> Result<Ident, GenerateError> {
    if let Some(existing) = ctx.registry.find_row(entity)? {
        return Ok(existing);
    }
    let ident = naming::row_adapter(&entity.name);
    let decl = RowAdapterDecl {
        ident:       ident.clone(),
        entity:      entity.name.clone(),
        fingerprint: entity.fingerprint(),
        body:        body(ctx, entity)
    };
    ctx.registry.note_entity_converters(entity);
    ctx.registry.push_row(decl);
    Ok(ident)
}
