// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Interface methods and their category payloads.

use syn::{Ident, Type};

use super::ident;

/// How a generated method delivers its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Concurrency {
    /// Synchronous `Result<V, DaoError>`.
    #[default]
    Direct,

    /// Callback delivery through `TransactionCallback<V>`.
    Suspend,

    /// Background execution returning `QueryFuture<V>`.
    Future,

    /// Invalidation-driven `QueryStream<V>`.
    Stream
}

impl Concurrency {
    /// Whether the method body runs off the caller's thread.
    pub const fn is_async(self) -> bool {
        !matches!(self, Self::Direct)
    }
}

/// Behavior on a uniqueness violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// Abort the statement, keep the transaction.
    #[default]
    Abort,

    /// Replace the conflicting row.
    Replace,

    /// Skip the row.
    Ignore,

    /// Roll back the transaction.
    Rollback,

    /// Fail the statement, keep prior changes.
    Fail
}

impl ConflictPolicy {
    /// SQLite keyword used after `INSERT OR` / `UPDATE OR`.
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Abort => "ABORT",
            Self::Replace => "REPLACE",
            Self::Ignore => "IGNORE",
            Self::Rollback => "ROLLBACK",
            Self::Fail => "FAIL"
        }
    }
}

/// Row type of a query result.
#[derive(Debug, Clone)]
pub enum RowShape {
    /// An entity from the model, read through its row adapter.
    Entity(Ident),

    /// A single column read with `FromValue`.
    Scalar(Type)
}

/// Number of rows a read produces.
#[derive(Debug, Clone)]
pub enum ResultShape {
    /// First row only. Zero rows is an error unless `nullable`.
    Single {
        /// Row type.
        row:      RowShape,
        /// Declared as `Option<_>`.
        nullable: bool
    },

    /// Every row, as `Vec<_>`.
    List {
        /// Row type.
        row: RowShape
    }
}

impl ResultShape {
    /// Row type regardless of multiplicity.
    pub fn row(&self) -> &RowShape {
        match self {
            Self::Single {
                row, ..
            }
            | Self::List {
                row
            } => row
        }
    }
}

/// A parameter driving a shortcut method.
#[derive(Debug, Clone)]
pub struct ShortcutTarget {
    /// Parameter holding the entity or entities.
    pub param: Ident,

    /// Entity type name.
    pub entity: Ident,

    /// Whether the parameter is a collection.
    pub many: bool
}

impl ShortcutTarget {
    /// Target a single entity parameter.
    pub fn new(param: &str, entity: &str) -> Self {
        Self {
            param:  ident(param),
            entity: ident(entity),
            many:   false
        }
    }

    /// Mark the parameter as a collection.
    #[must_use]
    pub fn many(mut self) -> Self {
        self.many = true;
        self
    }
}

/// Category payload of a method.
#[derive(Debug, Clone)]
pub enum MethodKind {
    /// `SELECT`-style query.
    ReadQuery {
        /// SQL template.
        sql:            String,
        /// Result shape; derived from the return type when `None`.
        shape:          Option<ResultShape>,
        /// Observed tables; scanned from the SQL when empty.
        tables:         Vec<String>,
        /// Run inside a transaction.
        in_transaction: bool
    },

    /// `INSERT`/`UPDATE`/`DELETE` statement.
    WriteQuery {
        /// SQL template.
        sql: String
    },

    /// Insert entities.
    Insert {
        /// Entity parameters.
        targets:  Vec<ShortcutTarget>,
        /// Conflict policy.
        conflict: ConflictPolicy
    },

    /// Delete entities by primary key.
    Delete {
        /// Entity parameters.
        targets: Vec<ShortcutTarget>
    },

    /// Update entities by primary key.
    Update {
        /// Entity parameters.
        targets:  Vec<ShortcutTarget>,
        /// Conflict policy.
        conflict: ConflictPolicy
    },

    /// Insert entities, updating the ones that already exist.
    Upsert {
        /// Entity parameters.
        targets: Vec<ShortcutTarget>
    },

    /// Call `body(self, args..)` inside a transaction.
    Transaction {
        /// Function taking `&Self` followed by the method arguments.
        body: syn::Path
    },

    /// Query supplied at call time.
    RawQuery {
        /// Parameter holding the SQL text or statement.
        query_param: Option<Ident>,
        /// Result shape; derived from the return type when `None`.
        shape:       Option<ResultShape>,
        /// Observed tables for streaming.
        tables:      Vec<String>
    },

    /// Forward to another method of the same trait.
    Delegate {
        /// Target method name.
        target: Ident
    }
}

impl MethodKind {
    /// Read query with a derived shape.
    pub fn read(sql: &str) -> Self {
        Self::ReadQuery {
            sql:            sql.to_owned(),
            shape:          None,
            tables:         Vec::new(),
            in_transaction: false
        }
    }

    /// Read query running inside a transaction.
    pub fn read_in_transaction(sql: &str) -> Self {
        Self::ReadQuery {
            sql:            sql.to_owned(),
            shape:          None,
            tables:         Vec::new(),
            in_transaction: true
        }
    }

    /// Write query.
    pub fn write(sql: &str) -> Self {
        Self::WriteQuery {
            sql: sql.to_owned()
        }
    }

    /// Insert shortcut.
    pub fn insert(targets: impl IntoIterator<Item = ShortcutTarget>, conflict: ConflictPolicy) -> Self {
        Self::Insert {
            targets: targets.into_iter().collect(),
            conflict
        }
    }

    /// Delete shortcut.
    pub fn delete(targets: impl IntoIterator<Item = ShortcutTarget>) -> Self {
        Self::Delete {
            targets: targets.into_iter().collect()
        }
    }

    /// Update shortcut.
    pub fn update(targets: impl IntoIterator<Item = ShortcutTarget>, conflict: ConflictPolicy) -> Self {
        Self::Update {
            targets: targets.into_iter().collect(),
            conflict
        }
    }

    /// Upsert shortcut.
    pub fn upsert(targets: impl IntoIterator<Item = ShortcutTarget>) -> Self {
        Self::Upsert {
            targets: targets.into_iter().collect()
        }
    }

    /// Transaction wrapper around `body`.
    pub fn transaction(body: syn::Path) -> Self {
        Self::Transaction {
            body
        }
    }

    /// Raw query reading its statement from `param`.
    pub fn raw(param: &str) -> Self {
        Self::RawQuery {
            query_param: Some(ident(param)),
            shape:       None,
            tables:      Vec::new()
        }
    }

    /// Delegate to `target`.
    pub fn delegate(target: &str) -> Self {
        Self::Delegate {
            target: ident(target)
        }
    }

    /// Override the result shape of a read or raw query.
    #[must_use]
    pub fn with_shape(mut self, new_shape: ResultShape) -> Self {
        if let Self::ReadQuery {
            shape, ..
        }
        | Self::RawQuery {
            shape, ..
        } = &mut self
        {
            *shape = Some(new_shape);
        }
        self
    }

    /// Set the observed tables of a read or raw query.
    #[must_use]
    pub fn observing<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>
    {
        if let Self::ReadQuery {
            tables, ..
        }
        | Self::RawQuery {
            tables, ..
        } = &mut self
        {
            *tables = names.into_iter().map(Into::into).collect();
        }
        self
    }
}

/// A method parameter.
#[derive(Debug, Clone)]
pub struct Parameter {
    /// Parameter name.
    pub name: Ident,

    /// Declared type.
    pub ty: Type,

    /// Collection expanded into an `IN (...)` list.
    pub multiple: bool,

    /// Converter applied before binding.
    pub converter: Option<syn::Path>
}

impl Parameter {
    /// Create a scalar parameter.
    pub fn new(name: &str, ty: Type) -> Self {
        Self {
            name: ident(name),
            ty,
            multiple: false,
            converter: None
        }
    }

    /// Mark the parameter as expandable.
    #[must_use]
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    /// Convert through `converter` before binding.
    #[must_use]
    pub fn converter(mut self, converter: syn::Path) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Whether the declared type is a reference.
    pub fn is_borrowed(&self) -> bool {
        contains_reference(&self.ty)
    }
}

fn contains_reference(ty: &Type) -> bool {
    match ty {
        Type::Reference(_) => true,
        Type::Paren(inner) => contains_reference(&inner.elem),
        Type::Group(inner) => contains_reference(&inner.elem),
        Type::Slice(inner) => contains_reference(&inner.elem),
        Type::Array(inner) => contains_reference(&inner.elem),
        Type::Tuple(tuple) => tuple.elems.iter().any(contains_reference),
        Type::Path(path) => path.path.segments.iter().any(|segment| match &segment.arguments {
            syn::PathArguments::AngleBracketed(args) => args.args.iter().any(|arg| match arg {
                syn::GenericArgument::Type(ty) => contains_reference(ty),
                syn::GenericArgument::Lifetime(_) => true,
                _ => false
            }),
            _ => false
        }),
        _ => false
    }
}

/// A declared interface method.
#[derive(Debug, Clone)]
pub struct Method {
    /// Method name.
    pub name: Ident,

    /// Parameters in declaration order, `&self` excluded.
    pub params: Vec<Parameter>,

    /// Declared value type; `None` is unit.
    pub returns: Option<Type>,

    /// Result delivery.
    pub concurrency: Concurrency,

    /// Category payload.
    pub kind: MethodKind
}

impl Method {
    /// Create a direct method returning unit.
    pub fn new(name: &str, kind: MethodKind) -> Self {
        Self {
            name: ident(name),
            params: Vec::new(),
            returns: None,
            concurrency: Concurrency::Direct,
            kind
        }
    }

    /// Append a parameter.
    #[must_use]
    pub fn param(mut self, param: Parameter) -> Self {
        self.params.push(param);
        self
    }

    /// Set the declared value type.
    #[must_use]
    pub fn returns(mut self, ty: Type) -> Self {
        self.returns = Some(ty);
        self
    }

    /// Set the delivery kind.
    #[must_use]
    pub fn concurrency(mut self, concurrency: Concurrency) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Look up a parameter by name.
    pub fn find_param(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name == name)
    }
}
