// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Cursor consumption shared by every delivery kind.

use proc_macro2::TokenStream;
use quote::quote;

use crate::{
    classify::{Multiplicity, Row, Shape},
    context::Context,
    error::GenerateError,
    registry
};

/// Expressions reading the current row.
#[derive(Debug, Clone)]
pub struct RowRead {
    /// Reads the row as the row type.
    pub value:    TokenStream,
    /// Reads the row as `Option` of the row type; `NULL` scalars are `None`.
    pub optional: TokenStream
}

/// Row read expressions for `row`, registering its adapter if needed.
///
/// # Errors
///
/// Propagates row-adapter collisions.
pub fn row(ctx: &mut Context<'_>, row: &Row<'_>) -> Result<RowRead, GenerateError> {
    Ok(match row {
        Row::Entity(entity) => {
            let adapter = registry::row_adapter(ctx, entity)?;
            let value = quote!(Self::#adapter(&_cursor)?);
            RowRead {
                optional: quote!(::std::option::Option::Some(#value)),
                value
            }
        }
        Row::Scalar(ty) => RowRead {
            value:    quote!(_cursor.get::<#ty>(0)?),
            optional: quote!(_cursor.get::<::std::option::Option<#ty>>(0)?)
        }
    })
}

/// Inputs of [`consume`].
#[derive(Debug)]
pub struct Consume<'s, 'a> {
    /// Database handle expression.
    pub db:        TokenStream,
    /// `&SqlQuery` expression.
    pub statement: &'s TokenStream,
    /// `Option<&CancellationSignal>` expression.
    pub signal:    TokenStream,
    /// Result shape.
    pub shape:     &'s Shape<'a>,
    /// Row reads.
    pub row:       &'s RowRead,
    /// Produce `Result<Option<V>, _>` for a stream, where a missing single
    /// row is `Ok(None)`.
    pub streaming: bool
}

/// Run the query, read the declared shape, close the cursor and return.
pub fn consume(ctx: &Context<'_>, input: Consume<'_, '_>) -> TokenStream {
    let rt = &ctx.runtime;
    let Consume {
        db,
        statement,
        signal,
        shape,
        row,
        streaming
    } = input;
    let value_ty = &shape.value;
    let value = &row.value;
    let optional = &row.optional;

    let missing = if streaming {
        quote!(return ::std::result::Result::Ok(::std::option::Option::None);)
    } else {
        quote! {
            return ::std::result::Result::Err(#rt::DaoError::MissingResult {
                sql: ::std::string::ToString::to_string(#rt::SqlQuery::sql(#statement))
            });
        }
    };
    let done = if streaming {
        quote!(::std::result::Result::Ok(::std::option::Option::Some(_result)))
    } else {
        quote!(::std::result::Result::Ok(_result))
    };

    let read = match shape.multiplicity {
        Multiplicity::Single => quote! {
            let _result: #value_ty = if _cursor.move_to_next()? {
                #value
            } else {
                #missing
            };
        },
        Multiplicity::Optional => quote! {
            let _result: #value_ty = if _cursor.move_to_next()? {
                #optional
            } else {
                ::std::option::Option::None
            };
        },
        Multiplicity::List => quote! {
            let mut _result: #value_ty = ::std::vec::Vec::with_capacity(_cursor.count());
            while _cursor.move_to_next()? {
                let _item = #value;
                _result.push(_item);
            }
        }
    };

    quote! {
        let mut _cursor = #db.query(#statement, #signal)?;
        #read
        _cursor.close();
        #done
    }
}
