// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Interface model consumed by the compiler.
//!
//! The model is produced by a front-end (annotation processing, a build
//! script, a hand-written table) and is treated as already validated for
//! shape: unique method names, resolved types. The compiler still checks
//! everything it relies on and reports violations as
//! [`GenerateError`](crate::GenerateError)s.
//!
//! # Structure
//!
//! ```text
//! InterfaceModel
//! ├── name           trait being implemented
//! ├── methods[]      Method { name, params[], returns, concurrency, kind }
//! ├── entities[]     Entity { name, table, fields[], primary_key[], projection_of }
//! ├── converters[]   declared TypeConverter implementations
//! └── backing_type   optional handle type accepted by the constructor
//! ```
//!
//! # Example
//!
//! ```rust
//! use daogen_impl::model::{Entity, Field, InterfaceModel, Method, MethodKind, Parameter};
//! use syn::parse_quote;
//!
//! let user = Entity::new("User", "users")
//!     .field(Field::new("id", "id"))
//!     .field(Field::new("name", "name"))
//!     .primary_key(["id"]);
//!
//! let model = InterfaceModel::new("UserDao")
//!     .entity(user)
//!     .method(
//!         Method::new("find", MethodKind::read("SELECT * FROM users WHERE id = :id"))
//!             .param(Parameter::new("id", parse_quote!(i64)))
//!             .returns(parse_quote!(User))
//!     );
//! assert_eq!(model.methods.len(), 1);
//! ```

mod entity;
mod method;

pub use entity::{Entity, Field};
pub use method::{
    Concurrency, ConflictPolicy, Method, MethodKind, Parameter, ResultShape, RowShape,
    ShortcutTarget
};
use proc_macro2::Span;
use syn::Ident;

/// A data-access interface to implement.
#[derive(Debug, Clone)]
pub struct InterfaceModel {
    /// Trait implemented by the generated type.
    pub name: Ident,

    /// Declared methods in declaration order.
    pub methods: Vec<Method>,

    /// Entity and projection types referenced by the methods.
    pub entities: Vec<Entity>,

    /// Declared custom value converters.
    pub converters: Vec<syn::Path>,

    /// Handle type accepted by the constructor instead of
    /// `Arc<Database>`; must implement `Into<Arc<Database>>`.
    pub backing_type: Option<syn::Type>
}

impl InterfaceModel {
    /// Create an empty model for the trait `name`.
    pub fn new(name: &str) -> Self {
        Self {
            name:         ident(name),
            methods:      Vec::new(),
            entities:     Vec::new(),
            converters:   Vec::new(),
            backing_type: None
        }
    }

    /// Add a method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    /// Add an entity.
    #[must_use]
    pub fn entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }

    /// Declare a converter.
    #[must_use]
    pub fn converter(mut self, path: syn::Path) -> Self {
        self.converters.push(path);
        self
    }

    /// Accept `ty` in the constructor.
    #[must_use]
    pub fn backing_type(mut self, ty: syn::Type) -> Self {
        self.backing_type = Some(ty);
        self
    }

    /// Look up an entity by type name.
    pub fn find_entity(&self, name: &Ident) -> Option<&Entity> {
        self.entities.iter().find(|e| &e.name == name)
    }

    /// Look up a method by name.
    pub fn find_method(&self, name: &Ident) -> Option<&Method> {
        self.methods.iter().find(|m| &m.name == name)
    }
}

/// Identifier with call-site span.
pub(crate) fn ident(name: &str) -> Ident {
    Ident::new(name, Span::call_site())
}
