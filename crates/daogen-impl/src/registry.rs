// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Shared helper registry.
//!
//! Binders ask the registry for helpers instead of declaring them. A helper
//! is identified by its uniqueness signature:
//!
//! | Helper | Signature |
//! |--------|-----------|
//! | Insert adapter | `insert:{Entity}:{POLICY}` |
//! | Delete adapter | `delete:{Entity}` |
//! | Update adapter | `update:{Entity}:{POLICY}` |
//! | Upsert adapter | `upsert:{Entity}` |
//! | Prepared write | `prepared:{method}` |
//! | Row adapter | `row:{Entity}` |
//!
//! A projection appears as `{Projection}>{Entity}`. Equal signatures yield
//! the same field; equal signatures over structurally different entities
//! are a [`GenerateError::HelperCollision`].

mod adapter;
mod prepared;
mod row;

use std::collections::{BTreeSet, HashMap};

pub use adapter::{deletion, insertion, update, upsertion};
pub use prepared::prepared_statement;
use proc_macro2::{Span, TokenStream};
pub use row::row_adapter;
use syn::Ident;
use tracing::debug;

use crate::{
    error::GenerateError,
    ir::{FieldDecl, RowAdapterDecl},
    model::Entity
};

/// A helper the registry should hold.
#[derive(Debug, Clone)]
pub struct HelperRequest {
    /// Uniqueness signature.
    pub key:         String,
    /// Structural identity of what the helper operates on.
    pub fingerprint: String,
    /// Preferred field name.
    pub name:        String,
    /// Field type.
    pub ty:          TokenStream,
    /// Field initializer.
    pub init:        TokenStream
}

/// Helpers discovered during one generation pass.
#[derive(Debug, Default)]
pub struct Registry {
    fields:     Vec<FieldDecl>,
    by_key:     HashMap<String, usize>,
    rows:       Vec<RowAdapterDecl>,
    converters: BTreeSet<String>
}

impl Registry {
    /// Return the field for `request.key`, declaring it on first use.
    ///
    /// # Errors
    ///
    /// [`GenerateError::HelperCollision`] when the signature is already
    /// taken by a different fingerprint.
    pub fn request(&mut self, request: HelperRequest) -> Result<Ident, GenerateError> {
        if let Some(&index) = self.by_key.get(&request.key) {
            let existing = &self.fields[index];
            if existing.fingerprint != request.fingerprint {
                return Err(GenerateError::HelperCollision {
                    key:    request.key,
                    first:  existing.fingerprint.clone(),
                    second: request.fingerprint
                });
            }
            return Ok(existing.ident.clone());
        }

        let ident = self.unique_name(&request.name);
        debug!(key = %request.key, field = %ident, "registered shared helper");
        self.by_key.insert(request.key.clone(), self.fields.len());
        self.fields.push(FieldDecl {
            ident: ident.clone(),
            ty: request.ty,
            init: request.init,
            key: request.key,
            fingerprint: request.fingerprint
        });
        Ok(ident)
    }

    /// Whether a row adapter for `entity` exists; errors on a structural
    /// mismatch.
    fn find_row(&self, entity: &Entity) -> Result<Option<Ident>, GenerateError> {
        let Some(existing) = self.rows.iter().find(|r| r.entity == entity.name) else {
            return Ok(None);
        };
        let fingerprint = entity.fingerprint();
        if existing.fingerprint != fingerprint {
            return Err(GenerateError::HelperCollision {
                key:    format!("row:{}", entity.name),
                first:  existing.fingerprint.clone(),
                second: fingerprint
            });
        }
        Ok(Some(existing.ident.clone()))
    }

    fn push_row(&mut self, decl: RowAdapterDecl) {
        debug!(entity = %decl.entity, function = %decl.ident, "registered row adapter");
        self.rows.push(decl);
    }

    /// Record a converter used by generated code.
    pub fn note_converter(&mut self, path: &syn::Path) {
        self.converters.insert(crate::naming::path_to_string(path));
    }

    /// Record every converter of an entity's fields.
    pub fn note_entity_converters(&mut self, entity: &Entity) {
        for converter in entity.fields.iter().filter_map(|f| f.converter.as_ref()) {
            self.note_converter(converter);
        }
    }

    /// Helper fields in discovery order.
    #[cfg(test)]
    pub fn fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    /// Split into fields, row adapters and sorted converter paths.
    pub fn into_parts(self) -> (Vec<FieldDecl>, Vec<RowAdapterDecl>, Vec<String>) {
        (self.fields, self.rows, self.converters.into_iter().collect())
    }

    fn unique_name(&self, base: &str) -> Ident {
        let taken = |name: &str| self.fields.iter().any(|f| f.ident == name);
        let mut name = base.to_owned();
        let mut suffix = 0;
        while taken(&name) {
            suffix += 1;
            name = format!("{base}_{suffix}");
        }
        Ident::new(&name, Span::call_site())
    }
}

/// Label of an entity inside a signature.
pub(crate) fn entity_label(entity: &Entity) -> String {
    match &entity.projection_of {
        Some(full) => format!("{}>{full}", entity.name),
        None => entity.name.to_string()
    }
}
