// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    rustdoc::missing_crate_level_docs,
    rustdoc::broken_intra_doc_links,
    rust_2018_idioms
)]
#![deny(unsafe_code)]

//! # Pipeline
//!
//! ```text
//! InterfaceModel
//!       │
//!       ▼
//! ┌─────────────┐   every method checked; all problems reported together
//! │  classify   │──────────────────────────────────────────► GenerateError
//! └─────────────┘
//!       │ Category + payload
//!       ▼
//! ┌─────────────┐   read / write / shortcut / transaction / raw / delegate
//! │   binders   │◄──► Registry (shared helpers, row adapters, converters)
//! └─────────────┘
//!       │ MethodPlan
//!       ▼
//! ┌─────────────┐
//! │  assemble   │──► ImplPlan ──► TokenStream
//! └─────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use daogen_impl::{
//!     generate,
//!     model::{Entity, Field, InterfaceModel, Method, MethodKind, Parameter}
//! };
//! use syn::parse_quote;
//!
//! let model = InterfaceModel::new("UserDao")
//!     .entity(
//!         Entity::new("User", "users")
//!             .field(Field::new("id", "id"))
//!             .field(Field::new("name", "name"))
//!             .primary_key(["id"])
//!     )
//!     .method(
//!         Method::new("find", MethodKind::read("SELECT * FROM users WHERE id = :id"))
//!             .param(Parameter::new("id", parse_quote!(i64)))
//!             .returns(parse_quote!(Option<User>))
//!     );
//!
//! let tokens = generate(&model)?;
//! assert!(tokens.to_string().contains("UserDaoImpl"));
//! # Ok::<(), daogen_impl::GenerateError>(())
//! ```

pub mod model;

mod assemble;
mod bind;
mod classify;
mod context;
mod delegate;
mod error;
mod ir;
mod naming;
mod raw;
mod read;
mod registry;
mod result;
mod shortcut;
mod sql;
mod transaction;
mod types;
mod write;

pub use error::GenerateError;
pub use ir::{FieldDecl, ImplPlan, MethodPlan, RowAdapterDecl};
use proc_macro2::TokenStream;
use quote::ToTokens;
pub use sql::{Placeholder, SqlTemplate, StatementKind};
use syn::parse_quote;
use tracing::{debug, info_span};

use crate::{
    classify::{Category, Classified, classify},
    context::Context
};

/// Generation options.
///
/// | Field | Default | Description |
/// |-------|---------|-------------|
/// | `runtime` | `::daogen_core` | Path of the runtime crate in generated code |
/// | `impl_suffix` | `Impl` | Appended to the trait name to name the type |
#[derive(Debug, Clone)]
pub struct Options {
    /// Runtime crate path, e.g. `::daogen::runtime` behind the facade.
    pub runtime:     syn::Path,
    /// Suffix of the generated type name.
    pub impl_suffix: String
}

impl Default for Options {
    fn default() -> Self {
        Self {
            runtime:     parse_quote!(::daogen_core),
            impl_suffix: "Impl".to_owned()
        }
    }
}

/// Generate the implementation of `model` with default [`Options`].
///
/// # Errors
///
/// Every problem found in the model; nothing is emitted when any method
/// fails.
pub fn generate(model: &model::InterfaceModel) -> Result<TokenStream, GenerateError> {
    generate_with(model, &Options::default())
}

/// Generate the implementation of `model`.
///
/// # Errors
///
/// See [`generate`].
pub fn generate_with(model: &model::InterfaceModel, options: &Options) -> Result<TokenStream, GenerateError> {
    plan(model, options).map(|plan| plan.into_token_stream())
}

/// Decide everything about the implementation of `model` without printing
/// it.
///
/// # Errors
///
/// See [`generate`].
pub fn plan(model: &model::InterfaceModel, options: &Options) -> Result<ImplPlan, GenerateError> {
    let span = info_span!("daogen::generate", interface = %model.name);
    let _guard = span.enter();

    let mut classified = Vec::with_capacity(model.methods.len());
    let mut errors = Vec::new();
    for method in &model.methods {
        match classify(model, method) {
            Ok(c) => {
                debug!(
                    method = %method.name,
                    category = c.category.tag(),
                    concurrency = classify::concurrency_name(method.concurrency),
                    "classified method"
                );
                classified.push(c);
            }
            Err(err) => errors.push(err)
        }
    }
    if let Some(err) = GenerateError::combine(errors) {
        return Err(err);
    }

    let mut ctx = Context::new(model, options);
    let mut methods = Vec::with_capacity(classified.len());
    let mut errors = Vec::new();
    for c in &classified {
        for converter in c.method.params.iter().filter_map(|p| p.converter.as_ref()) {
            ctx.registry.note_converter(converter);
        }
        match lower(&mut ctx, c) {
            Ok(body) => methods.push(MethodPlan {
                name: c.method.name.clone(),
                category: c.category.tag(),
                concurrency: c.method.concurrency,
                signature: assemble::signature(&ctx, c.method),
                body
            }),
            Err(err) => errors.push(err)
        }
    }
    if let Some(err) = GenerateError::combine(errors) {
        return Err(err);
    }

    let Context {
        runtime,
        impl_name,
        registry,
        ..
    } = ctx;
    let (fields, row_adapters, converters) = registry.into_parts();
    debug!(
        fields = fields.len(),
        row_adapters = row_adapters.len(),
        converters = converters.len(),
        "planned implementation"
    );
    Ok(ImplPlan {
        trait_name: model.name.clone(),
        impl_name,
        runtime,
        backing_type: model.backing_type.clone(),
        fields,
        row_adapters,
        methods,
        converters
    })
}

fn lower(ctx: &mut Context<'_>, classified: &Classified<'_>) -> Result<TokenStream, GenerateError> {
    let method = classified.method;
    match &classified.category {
        Category::Read(read) => read::lower(ctx, method, read),
        Category::Write(write) => write::lower(ctx, method, write),
        Category::Shortcut(shortcut) => shortcut::lower(ctx, method, shortcut),
        Category::Transaction {
            body
        } => transaction::lower(ctx, method, body),
        Category::Raw(raw) => raw::lower(ctx, method, raw),
        Category::Delegate {
            target
        } => Ok(delegate::lower(ctx, method, target))
    }
}

#[cfg(test)]
mod tests {
    use syn::parse_quote;

    use super::*;
    use crate::model::{
        Concurrency, ConflictPolicy, Entity, Field, InterfaceModel, Method, MethodKind, Parameter,
        ShortcutTarget
    };

    fn user() -> Entity {
        Entity::new("User", "users")
            .field(Field::new("id", "id"))
            .field(Field::new("name", "name"))
            .field(Field::new("email", "email").nullable())
            .primary_key(["id"])
    }

    fn parses(tokens: TokenStream) -> syn::File {
        syn::parse2::<syn::File>(tokens).unwrap()
    }

    #[test]
    fn equal_signatures_emit_one_helper_field() {
        let model = InterfaceModel::new("UserDao")
            .entity(user())
            .method(
                Method::new("add", MethodKind::insert([ShortcutTarget::new("user", "User")], ConflictPolicy::Abort))
                    .param(Parameter::new("user", parse_quote!(&User)))
            )
            .method(
                Method::new(
                    "add_all",
                    MethodKind::insert([ShortcutTarget::new("users", "User").many()], ConflictPolicy::Abort)
                )
                .param(Parameter::new("users", parse_quote!(&[User])))
            )
            .method(
                Method::new(
                    "replace",
                    MethodKind::insert([ShortcutTarget::new("user", "User")], ConflictPolicy::Replace)
                )
                .param(Parameter::new("user", parse_quote!(&User)))
            );
        let plan = plan(&model, &Options::default()).unwrap();
        assert_eq!(plan.fields.len(), 2);
        let abort = plan.field("insert:User:ABORT").unwrap();
        assert_eq!(abort.ident, "__insertion_adapter_of_user");
        assert_eq!(plan.field("insert:User:REPLACE").unwrap().ident, "__insertion_adapter_of_user_1");

        let file = parses(plan.into_token_stream());
        assert_eq!(file.items.len(), 3);
    }

    #[test]
    fn full_interface_is_valid_rust() {
        let model = InterfaceModel::new("UserDao")
            .entity(user())
            .converter(parse_quote!(crate::DayConverter))
            .method(
                Method::new("find", MethodKind::read("SELECT * FROM users WHERE id = :id"))
                    .param(Parameter::new("id", parse_quote!(i64)))
                    .returns(parse_quote!(Option<User>))
            )
            .method(
                Method::new("watch_all", MethodKind::read("SELECT * FROM users"))
                    .returns(parse_quote!(Vec<User>))
                    .concurrency(Concurrency::Stream)
            )
            .method(
                Method::new("by_ids", MethodKind::read("SELECT * FROM users WHERE id IN (:ids)"))
                    .param(Parameter::new("ids", parse_quote!(Vec<i64>)).multiple())
                    .returns(parse_quote!(Vec<User>))
                    .concurrency(Concurrency::Future)
            )
            .method(
                Method::new("since", MethodKind::read("SELECT COUNT(*) FROM users WHERE joined >= ?"))
                    .param(Parameter::new("day", parse_quote!(Day)).converter(parse_quote!(crate::DayConverter)))
                    .returns(parse_quote!(i64))
            )
            .method(
                Method::new("rename", MethodKind::write("UPDATE users SET name = ? WHERE id = ?"))
                    .param(Parameter::new("name", parse_quote!(String)))
                    .param(Parameter::new("id", parse_quote!(i64)))
                    .concurrency(Concurrency::Suspend)
            )
            .method(
                Method::new("save", MethodKind::upsert([ShortcutTarget::new("user", "User")]))
                    .param(Parameter::new("user", parse_quote!(User)))
                    .returns(parse_quote!(i64))
            )
            .method(
                Method::new("reset", MethodKind::transaction(parse_quote!(crate::reset)))
                    .param(Parameter::new("users", parse_quote!(Vec<User>)))
            )
            .method(
                Method::new("raw", MethodKind::raw("query"))
                    .param(Parameter::new("query", parse_quote!(&SqlQuery)))
                    .returns(parse_quote!(Vec<User>))
            )
            .method(
                Method::new("lookup", MethodKind::delegate("find"))
                    .param(Parameter::new("id", parse_quote!(i32)))
                    .returns(parse_quote!(Option<User>))
            );
        let plan = plan(&model, &Options::default()).unwrap();
        assert_eq!(plan.converters, ["crate::DayConverter"]);
        assert_eq!(plan.row_adapters.len(), 1);
        assert_eq!(plan.method("rename").unwrap().category, "write query");
        assert!(plan.field("prepared:rename").is_some());

        let code = plan.to_token_stream().to_string().replace(' ', "");
        assert!(code.contains("&[\"crate::DayConverter\"]"));
        assert!(code.contains("implUserDaoforUserDaoImpl"));
        parses(plan.into_token_stream());
    }

    #[test]
    fn nothing_is_emitted_when_any_method_fails() {
        let model = InterfaceModel::new("UserDao")
            .entity(user())
            .method(
                Method::new("find", MethodKind::read("SELECT * FROM users WHERE id = :id"))
                    .returns(parse_quote!(User))
            )
            .method(
                Method::new("remove", MethodKind::delete([ShortcutTarget::new("user", "Ghost")]))
                    .param(Parameter::new("user", parse_quote!(&Ghost)))
            )
            .method(Method::new("ok", MethodKind::write("DELETE FROM users")));
        let err = generate(&model).unwrap_err();
        assert!(matches!(err, GenerateError::Multiple(ref errors) if errors.len() == 2));
        assert_eq!(err.iter().count(), 2);
    }

    #[test]
    fn backing_type_replaces_constructor_argument() {
        let model = InterfaceModel::new("Dao")
            .backing_type(parse_quote!(crate::AppDatabase))
            .method(Method::new("clear", MethodKind::write("DELETE FROM t")));
        let options = Options {
            runtime: parse_quote!(::daogen::runtime),
            impl_suffix: "Generated".to_owned()
        };
        let code = generate_with(&model, &options).unwrap().to_string().replace(' ', "");
        assert!(code.contains("pubstructDaoGenerated"));
        assert!(code.contains(
            "pubfnnew(__backing:crate::AppDatabase)->Self{let__db:::std::sync::Arc<::daogen::runtime::Database>=::std::convert::Into::into(__backing);"
        ));
    }
}
