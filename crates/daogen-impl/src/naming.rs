// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Names of generated items.
//!
//! | Item | Name |
//! |------|------|
//! | Insert adapter of `User` | `__insertion_adapter_of_user` |
//! | Delete adapter | `__deletion_adapter_of_user` |
//! | Update adapter | `__update_adapter_of_user` |
//! | Upsert adapter | `__upsertion_adapter_of_user` |
//! | Prepared write of `clear` | `__prepared_stmt_of_clear` |
//! | Row adapter of `User` | `__entity_cursor_converter_user` |

use convert_case::{Case, Casing};
use proc_macro2::Span;
use quote::ToTokens;
use syn::Ident;

/// Snake-case form of a type or method name.
pub fn snake(ident: &Ident) -> String {
    ident.to_string().to_case(Case::Snake)
}

/// Identifier `{prefix}{snake(ident)}`.
pub fn prefixed(prefix: &str, ident: &Ident) -> Ident {
    Ident::new(&format!("{prefix}{}", snake(ident)), Span::call_site())
}

/// Path rendered without token spacing, e.g. `crate::conv::DateConverter`.
pub fn path_to_string(path: &syn::Path) -> String {
    compact(path.to_token_stream().to_string())
}

/// Type rendered without token spacing.
pub fn type_to_string(ty: &syn::Type) -> String {
    compact(ty.to_token_stream().to_string())
}

fn compact(rendered: String) -> String {
    rendered.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Row-adapter function name for an entity.
pub fn row_adapter(entity: &Ident) -> Ident {
    prefixed("__entity_cursor_converter_", entity)
}

/// Local holding the column index of a field in a row adapter.
pub fn column_index(field: &Ident) -> Ident {
    Ident::new(&format!("_index_of_{field}"), Span::call_site())
}
