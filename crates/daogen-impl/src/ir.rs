// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Intermediate representation of a generated implementation.
//!
//! [`ImplPlan`] records what was decided for an interface: helper fields,
//! row adapters, method bodies and required converters. Printing it is the
//! job of [`crate::assemble`], so tests can inspect decisions without
//! parsing emitted code.

use proc_macro2::TokenStream;
use syn::{Ident, Type};

use crate::model::Concurrency;

/// A shared helper stored as a field of the generated type.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    /// Field name.
    pub ident: Ident,

    /// Field type.
    pub ty: TokenStream,

    /// Initializer; may refer to the `__db` handle.
    pub init: TokenStream,

    /// Uniqueness signature.
    pub key: String,

    /// Structural identity of the entity behind the helper.
    pub fingerprint: String
}

/// An associated function converting the current cursor row into an entity.
#[derive(Debug, Clone)]
pub struct RowAdapterDecl {
    /// Function name.
    pub ident: Ident,

    /// Entity type name.
    pub entity: Ident,

    /// Structural identity of the entity.
    pub fingerprint: String,

    /// Function body.
    pub body: TokenStream
}

/// One generated trait method.
#[derive(Debug, Clone)]
pub struct MethodPlan {
    /// Method name.
    pub name: Ident,

    /// Category tag, e.g. `"read query"`.
    pub category: &'static str,

    /// Delivery kind.
    pub concurrency: Concurrency,

    /// Signature without the body.
    pub signature: TokenStream,

    /// Body statements.
    pub body: TokenStream
}

/// Everything needed to print one implementation.
#[derive(Debug, Clone)]
pub struct ImplPlan {
    /// Implemented trait.
    pub trait_name: Ident,

    /// Generated type.
    pub impl_name: Ident,

    /// Runtime crate path.
    pub runtime: syn::Path,

    /// Constructor argument type replacing `Arc<Database>`.
    pub backing_type: Option<Type>,

    /// Shared helper fields in discovery order.
    pub fields: Vec<FieldDecl>,

    /// Row adapters in discovery order.
    pub row_adapters: Vec<RowAdapterDecl>,

    /// Methods in declaration order.
    pub methods: Vec<MethodPlan>,

    /// Sorted, deduplicated converter paths.
    pub converters: Vec<String>
}

impl ImplPlan {
    /// Look up a method plan by name.
    pub fn method(&self, name: &str) -> Option<&MethodPlan> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Look up a helper field by uniqueness signature.
    pub fn field(&self, key: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.key == key)
    }
}
