// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Entity write adapters.
//!
//! Each function registers (or reuses) the adapter of one shortcut kind and
//! returns its field name. Adapters are built in the constructor from
//! the `__db` handle, the written table, the statement text, its slot count
//! and a binder closure writing the entity's fields into the statement.
//!
//! # Statements
//!
//! ```text
//! INSERT OR ABORT INTO `users` (`id`,`name`) VALUES (?,?)
//! DELETE FROM `users` WHERE `id` = ?
//! UPDATE OR ABORT `users` SET `id` = ?,`name` = ? WHERE `id` = ?
//! ```

use proc_macro2::TokenStream;
use quote::quote;
use syn::Ident;

use super::{HelperRequest, entity_label};
use crate::{
    context::Context,
    error::GenerateError,
    model::{ConflictPolicy, Entity, Field},
    naming::snake
};

fn quoted(name: &str) -> String {
    format!("`{name}`")
}

fn insert_sql(entity: &Entity, table: &str, conflict: Option<ConflictPolicy>) -> String {
    let columns: Vec<String> = entity.fields.iter().map(|f| quoted(&f.column)).collect();
    let placeholders = vec!["?"; columns.len()].join(",");
    let verb = match conflict {
        Some(policy) => format!("INSERT OR {} INTO", policy.keyword()),
        None => "INSERT INTO".to_owned()
    };
    format!(
        "{verb} {} ({}) VALUES ({placeholders})",
        quoted(table),
        columns.join(",")
    )
}

fn key_clause(entity: &Entity) -> String {
    entity
        .key_fields()
        .iter()
        .map(|f| format!("{} = ?", quoted(&f.column)))
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn delete_sql(entity: &Entity, table: &str) -> String {
    format!("DELETE FROM {} WHERE {}", quoted(table), key_clause(entity))
}

fn update_sql(entity: &Entity, table: &str, conflict: Option<ConflictPolicy>) -> String {
    let assignments: Vec<String> = entity
        .fields
        .iter()
        .map(|f| format!("{} = ?", quoted(&f.column)))
        .collect();
    let verb = match conflict {
        Some(policy) => format!("UPDATE OR {}", policy.keyword()),
        None => "UPDATE".to_owned()
    };
    format!(
        "{verb} {} SET {} WHERE {}",
        quoted(table),
        assignments.join(","),
        key_clause(entity)
    )
}

fn bind_field(ctx: &Context<'_>, index: usize, field: &Field) -> TokenStream {
    let rt = &ctx.runtime;
    let name = &field.name;
    match (&field.converter, field.nullable) {
        (None, _) => quote!(_statement.bind(#index, &_entity.#name);),
        (Some(converter), false) => quote! {
            _statement.bind(#index, &<#converter as #rt::TypeConverter>::to_column(&_entity.#name));
        },
        (Some(converter), true) => quote! {
            match &_entity.#name {
                ::std::option::Option::Some(_value) => {
                    _statement.bind(#index, &<#converter as #rt::TypeConverter>::to_column(_value))
                }
                ::std::option::Option::None => _statement.bind_null(#index)
            }
        }
    }
}

/// Binder closure over `fields`, numbered from 1 in order.
fn binder<'f>(
    ctx: &Context<'_>,
    entity: &Entity,
    fields: impl IntoIterator<Item = &'f Field>
) -> TokenStream {
    let rt = &ctx.runtime;
    let name = &entity.name;
    let binds = fields
        .into_iter()
        .enumerate()
        .map(|(i, field)| bind_field(ctx, i + 1, field));
    quote! {
        |_statement: &mut #rt::SqlQuery, _entity: &#name| {
            #(#binds)*
        }
    }
}

fn insert_adapter(
    ctx: &Context<'_>,
    entity: &Entity,
    table: &str,
    conflict: Option<ConflictPolicy>
) -> TokenStream {
    let rt = &ctx.runtime;
    let name = &entity.name;
    let sql = insert_sql(entity, table, conflict);
    let count = entity.fields.len();
    let bind = binder(ctx, entity, &entity.fields);
    quote! {
        #rt::InsertAdapter::<#name>::new(
            ::std::sync::Arc::clone(&__db),
            #table,
            #sql,
            #count,
            #bind
        )
    }
}

fn delete_adapter(ctx: &Context<'_>, entity: &Entity, table: &str) -> TokenStream {
    let rt = &ctx.runtime;
    let name = &entity.name;
    let sql = delete_sql(entity, table);
    let keys = entity.key_fields();
    let count = keys.len();
    let bind = binder(ctx, entity, keys);
    quote! {
        #rt::DeleteOrUpdateAdapter::<#name>::new(
            ::std::sync::Arc::clone(&__db),
            #table,
            #sql,
            #count,
            #bind
        )
    }
}

fn update_adapter(
    ctx: &Context<'_>,
    entity: &Entity,
    table: &str,
    conflict: Option<ConflictPolicy>
) -> TokenStream {
    let rt = &ctx.runtime;
    let name = &entity.name;
    let sql = update_sql(entity, table, conflict);
    let count = entity.fields.len() + entity.key_fields().len();
    let bind = binder(ctx, entity, entity.fields.iter().chain(entity.key_fields()));
    quote! {
        #rt::DeleteOrUpdateAdapter::<#name>::new(
            ::std::sync::Arc::clone(&__db),
            #table,
            #sql,
            #count,
            #bind
        )
    }
}

fn register(
    ctx: &mut Context<'_>,
    entity: &Entity,
    table: &str,
    key: String,
    prefix: &str,
    ty: TokenStream,
    init: TokenStream
) -> Result<Ident, GenerateError> {
    ctx.registry.note_entity_converters(entity);
    ctx.registry.request(HelperRequest {
        key,
        fingerprint: format!("{table}:{}", entity.fingerprint()),
        name: format!("{prefix}{}", snake(&entity.name)),
        ty,
        init
    })
}

/// Insert adapter of `entity` writing into `table`.
pub fn insertion(
    ctx: &mut Context<'_>,
    entity: &Entity,
    table: &str,
    conflict: ConflictPolicy
) -> Result<Ident, GenerateError> {
    let rt = &ctx.runtime;
    let name = &entity.name;
    let ty = quote!(#rt::InsertAdapter<#name>);
    let init = insert_adapter(ctx, entity, table, Some(conflict));
    let key = format!("insert:{}:{}", entity_label(entity), conflict.keyword());
    register(ctx, entity, table, key, "__insertion_adapter_of_", ty, init)
}

/// Delete-by-key adapter of `entity`.
pub fn deletion(ctx: &mut Context<'_>, entity: &Entity, table: &str) -> Result<Ident, GenerateError> {
    let rt = &ctx.runtime;
    let name = &entity.name;
    let ty = quote!(#rt::DeleteOrUpdateAdapter<#name>);
    let init = delete_adapter(ctx, entity, table);
    let key = format!("delete:{}", entity_label(entity));
    register(ctx, entity, table, key, "__deletion_adapter_of_", ty, init)
}

/// Update-by-key adapter of `entity`.
pub fn update(
    ctx: &mut Context<'_>,
    entity: &Entity,
    table: &str,
    conflict: ConflictPolicy
) -> Result<Ident, GenerateError> {
    let rt = &ctx.runtime;
    let name = &entity.name;
    let ty = quote!(#rt::DeleteOrUpdateAdapter<#name>);
    let init = update_adapter(ctx, entity, table, Some(conflict));
    let key = format!("update:{}:{}", entity_label(entity), conflict.keyword());
    register(ctx, entity, table, key, "__update_adapter_of_", ty, init)
}

/// Upsert adapter of `entity`: a plain insert falling back to a plain
/// update.
pub fn upsertion(ctx: &mut Context<'_>, entity: &Entity, table: &str) -> Result<Ident, GenerateError> {
    let rt = &ctx.runtime;
    let name = &entity.name;
    let ty = quote!(#rt::UpsertAdapter<#name>);
    let insert = insert_adapter(ctx, entity, table, None);
    let update = update_adapter(ctx, entity, table, None);
    let init = quote!(#rt::UpsertAdapter::new(#insert, #update));
    let key = format!("upsert:{}", entity_label(entity));
    register(ctx, entity, table, key, "__upsertion_adapter_of_", ty, init)
}
