// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Method classifier.
//!
//! Turns one [`Method`] into exactly one [`Category`] with everything the
//! category's binder needs already resolved: bound templates, entities,
//! result shapes, return modes. Every check that can fail happens here, so
//! binders never fail except on helper collisions.
//!
//! # Concurrency support
//!
//! | Category | Direct | Future | Suspend | Stream |
//! |----------|:------:|:------:|:-------:|:------:|
//! | read query | ✓ | ✓ | ✓ | ✓ |
//! | raw query | ✓ | ✓ | ✓ | ✓ |
//! | write query | ✓ | ✓ | ✓ | |
//! | shortcuts | ✓ | ✓ | ✓ | |
//! | transaction | ✓ | ✓ | ✓ | |
//! | delegate | ✓ | | | |
//!
//! A streaming raw query must name the tables it observes; its statement is
//! only known at run time, so nothing could trigger a re-run otherwise.

use syn::Type;

use crate::{
    bind::{self, BoundTemplate},
    error::GenerateError,
    model::{
        Concurrency, ConflictPolicy, Entity, InterfaceModel, Method, MethodKind, Parameter,
        ResultShape, RowShape, ShortcutTarget
    },
    naming,
    sql::StatementKind,
    types
};

/// How many rows a read yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplicity {
    /// First row; zero rows is an error.
    Single,

    /// First row or `None`.
    Optional,

    /// Every row.
    List
}

/// Resolved row type.
#[derive(Debug, Clone)]
pub enum Row<'a> {
    /// Entity read through its row adapter.
    Entity(&'a Entity),

    /// First column read with `FromValue`.
    Scalar(Type)
}

/// Resolved result shape.
#[derive(Debug, Clone)]
pub struct Shape<'a> {
    /// Row count.
    pub multiplicity: Multiplicity,

    /// Row type.
    pub row: Row<'a>,

    /// Declared value type.
    pub value: Type
}

/// Read query payload.
#[derive(Debug, Clone)]
pub struct Read<'a> {
    /// Bound template.
    pub query:          BoundTemplate<'a>,
    /// Result shape.
    pub shape:          Shape<'a>,
    /// Observed tables.
    pub tables:         Vec<String>,
    /// Run inside a transaction.
    pub in_transaction: bool
}

/// What a write query returns.
#[derive(Debug, Clone)]
pub enum WriteResult {
    /// Nothing.
    Unit,

    /// Affected rows, cast to the declared integer type.
    Count(Type),

    /// Row id of an `INSERT`.
    RowId
}

/// Write query payload.
#[derive(Debug, Clone)]
pub struct Write<'a> {
    /// Bound template.
    pub query:  BoundTemplate<'a>,
    /// Return mode.
    pub result: WriteResult,
    /// Tables the statement writes or reads.
    pub tables: Vec<String>
}

/// Shortcut operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutOp {
    /// Insert with a conflict policy.
    Insert(ConflictPolicy),

    /// Delete by key.
    Delete,

    /// Update by key with a conflict policy.
    Update(ConflictPolicy),

    /// Insert or update.
    Upsert
}

impl ShortcutOp {
    /// Category tag.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Insert(_) => "insert",
            Self::Delete => "delete",
            Self::Update(_) => "update",
            Self::Upsert => "upsert"
        }
    }

    const fn needs_key(self) -> bool {
        !matches!(self, Self::Insert(_))
    }
}

/// What a shortcut returns.
#[derive(Debug, Clone)]
pub enum ShortcutResult {
    /// Nothing.
    Unit,

    /// Affected rows, cast to the declared integer type.
    Count(Type),

    /// Row id of the single inserted entity.
    RowId,

    /// Row ids of the inserted collection.
    RowIds
}

/// A resolved shortcut target.
#[derive(Debug, Clone)]
pub struct Target<'a> {
    /// Parameter holding the entity or entities.
    pub param:  &'a Parameter,
    /// Entity or projection bound by the adapter.
    pub entity: &'a Entity,
    /// Table written to; the full entity's table for projections.
    pub table:  &'a str,
    /// Whether the parameter is a collection.
    pub many:   bool
}

/// Shortcut payload.
#[derive(Debug, Clone)]
pub struct Shortcut<'a> {
    /// Operation.
    pub op:      ShortcutOp,
    /// Targets in declaration order.
    pub targets: Vec<Target<'a>>,
    /// Return mode.
    pub result:  ShortcutResult
}

/// Source of a raw query's statement.
#[derive(Debug, Clone, Copy)]
pub enum RawSource<'a> {
    /// SQL text.
    Literal(&'a Parameter),

    /// Owned `SqlQuery`, consumed by the call.
    Owned(&'a Parameter),

    /// Borrowed `SqlQuery`, left to the caller.
    Borrowed(&'a Parameter),

    /// Nothing usable; a placeholder statement is generated.
    Fallback
}

/// Raw query payload.
#[derive(Debug, Clone)]
pub struct Raw<'a> {
    /// Statement source.
    pub source: RawSource<'a>,
    /// Result shape.
    pub shape:  Shape<'a>,
    /// Observed tables.
    pub tables: Vec<String>
}

/// The category of a method with its resolved payload.
#[derive(Debug, Clone)]
pub enum Category<'a> {
    /// `SELECT` with a result shape.
    Read(Read<'a>),

    /// `INSERT`/`UPDATE`/`DELETE` statement.
    Write(Write<'a>),

    /// Entity shortcut.
    Shortcut(Shortcut<'a>),

    /// Body called inside a transaction.
    Transaction {
        /// Body function.
        body: &'a syn::Path
    },

    /// Statement supplied at call time.
    Raw(Raw<'a>),

    /// Pass-through to another method.
    Delegate {
        /// Target method.
        target: &'a Method
    }
}

impl Category<'_> {
    /// Category tag.
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Read(_) => "read query",
            Self::Write(_) => "write query",
            Self::Shortcut(shortcut) => shortcut.op.tag(),
            Self::Transaction {
                ..
            } => "transaction",
            Self::Raw(_) => "raw query",
            Self::Delegate {
                ..
            } => "delegate"
        }
    }

    const fn supports(&self, concurrency: Concurrency) -> bool {
        match self {
            Self::Read(_) | Self::Raw(_) => true,
            Self::Delegate {
                ..
            } => matches!(concurrency, Concurrency::Direct),
            Self::Write(_)
            | Self::Shortcut(_)
            | Self::Transaction {
                ..
            } => !matches!(concurrency, Concurrency::Stream)
        }
    }

    /// Whether the method body moves its parameters off the caller's
    /// thread instead of binding them eagerly.
    const fn moves_parameters(&self) -> bool {
        matches!(
            self,
            Self::Shortcut(_)
                | Self::Transaction {
                    ..
                }
        )
    }
}

/// A classified method.
#[derive(Debug, Clone)]
pub struct Classified<'a> {
    /// Source method.
    pub method:   &'a Method,
    /// Category and payload.
    pub category: Category<'a>
}

/// Lowercase name of a concurrency kind.
pub const fn concurrency_name(concurrency: Concurrency) -> &'static str {
    match concurrency {
        Concurrency::Direct => "direct",
        Concurrency::Suspend => "suspend",
        Concurrency::Future => "future",
        Concurrency::Stream => "stream"
    }
}

/// Classify `method` of `model`.
///
/// # Errors
///
/// Every problem found in the method, combined with
/// [`GenerateError::combine`].
pub fn classify<'a>(
    model: &'a InterfaceModel,
    method: &'a Method
) -> Result<Classified<'a>, GenerateError> {
    let mut errors = check_converters(model, method);

    let category = match resolve(model, method) {
        Ok(category) => Some(category),
        Err(err) => {
            errors.push(err);
            None
        }
    };

    if let Some(category) = &category {
        if !category.supports(method.concurrency) {
            errors.push(GenerateError::UnsupportedConcurrency {
                method:      method.name.to_string(),
                category:    category.tag(),
                concurrency: concurrency_name(method.concurrency)
            });
        } else if method.concurrency.is_async() && category.moves_parameters() {
            errors.extend(
                method
                    .params
                    .iter()
                    .filter(|p| p.is_borrowed())
                    .map(|p| GenerateError::BorrowedAsyncParameter {
                        method: method.name.to_string(),
                        param:  p.name.to_string()
                    })
            );
        }
    }

    match (category, GenerateError::combine(errors)) {
        (Some(category), None) => Ok(Classified {
            method,
            category
        }),
        (_, Some(err)) => Err(err),
        (None, None) => Err(unclassifiable(method, "no category matched"))
    }
}

fn resolve<'a>(model: &'a InterfaceModel, method: &'a Method) -> Result<Category<'a>, GenerateError> {
    match &method.kind {
        MethodKind::ReadQuery {
            sql,
            shape,
            tables,
            in_transaction
        } => read(model, method, sql, shape.as_ref(), tables, *in_transaction),
        MethodKind::WriteQuery {
            sql
        } => write(method, sql),
        MethodKind::Insert {
            targets,
            conflict
        } => shortcut(model, method, ShortcutOp::Insert(*conflict), targets),
        MethodKind::Delete {
            targets
        } => shortcut(model, method, ShortcutOp::Delete, targets),
        MethodKind::Update {
            targets,
            conflict
        } => shortcut(model, method, ShortcutOp::Update(*conflict), targets),
        MethodKind::Upsert {
            targets
        } => shortcut(model, method, ShortcutOp::Upsert, targets),
        MethodKind::Transaction {
            body
        } => Ok(Category::Transaction {
            body
        }),
        MethodKind::RawQuery {
            query_param,
            shape,
            tables
        } => raw(model, method, query_param.as_ref(), shape.as_ref(), tables),
        MethodKind::Delegate {
            target
        } => delegate(model, method, target)
    }
}

fn unclassifiable(method: &Method, reason: impl Into<String>) -> GenerateError {
    GenerateError::Unclassifiable {
        method: method.name.to_string(),
        reason: reason.into()
    }
}

fn unsupported_return(method: &Method, ty: Option<&Type>, reason: &'static str) -> GenerateError {
    GenerateError::UnsupportedReturn {
        method: method.name.to_string(),
        returns: ty.map_or_else(|| "()".to_owned(), naming::type_to_string),
        reason
    }
}

fn check_converters(model: &InterfaceModel, method: &Method) -> Vec<GenerateError> {
    let declared: Vec<String> = model.converters.iter().map(naming::path_to_string).collect();
    method
        .params
        .iter()
        .filter_map(|p| p.converter.as_ref())
        .map(naming::path_to_string)
        .filter(|path| !declared.contains(path))
        .map(|converter| GenerateError::UnknownConverter {
            owner: method.name.to_string(),
            converter
        })
        .collect()
}

fn check_entity_converters(model: &InterfaceModel, entity: &Entity) -> Result<(), GenerateError> {
    let declared: Vec<String> = model.converters.iter().map(naming::path_to_string).collect();
    let missing = entity
        .fields
        .iter()
        .filter_map(|f| f.converter.as_ref())
        .map(naming::path_to_string)
        .find(|path| !declared.contains(path));
    match missing {
        Some(converter) => Err(GenerateError::UnknownConverter {
            owner: entity.name.to_string(),
            converter
        }),
        None => Ok(())
    }
}

fn find_entity<'a>(
    model: &'a InterfaceModel,
    method: &Method,
    name: &syn::Ident
) -> Result<&'a Entity, GenerateError> {
    let entity = model
        .find_entity(name)
        .ok_or_else(|| GenerateError::UnknownEntity {
            method: method.name.to_string(),
            entity: name.to_string()
        })?;
    check_entity_converters(model, entity)?;
    Ok(entity)
}

fn resolve_row<'a>(
    model: &'a InterfaceModel,
    method: &Method,
    shape: &RowShape
) -> Result<Row<'a>, GenerateError> {
    match shape {
        RowShape::Entity(name) => find_entity(model, method, name).map(Row::Entity),
        RowShape::Scalar(ty) => Ok(Row::Scalar(ty.clone()))
    }
}

/// Entity named by a bare type, or a scalar.
fn infer_row<'a>(model: &'a InterfaceModel, ty: &Type) -> Result<Row<'a>, GenerateError> {
    let entity = types::simple_name(ty)
        .and_then(|name| model.entities.iter().find(|e| e.name == name.as_str()));
    match entity {
        Some(entity) => {
            check_entity_converters(model, entity)?;
            Ok(Row::Entity(entity))
        }
        None => Ok(Row::Scalar(ty.clone()))
    }
}

/// Result shape of a read or raw query, checked against the return type.
fn shape<'a>(
    model: &'a InterfaceModel,
    method: &Method,
    declared: Option<&ResultShape>
) -> Result<Shape<'a>, GenerateError> {
    let Some(value) = method.returns.as_ref() else {
        return Err(unsupported_return(method, None, "queries must return a value"));
    };

    let (multiplicity, row) = match declared {
        Some(ResultShape::List {
            row: declared_row
        }) => {
            if types::generic_arg(value, "Vec").is_none() {
                return Err(unsupported_return(method, Some(value), "list results must be `Vec<_>`"));
            }
            (Multiplicity::List, resolve_row(model, method, declared_row)?)
        }
        Some(ResultShape::Single {
            row: declared_row,
            nullable
        }) => {
            if *nullable && types::generic_arg(value, "Option").is_none() {
                return Err(unsupported_return(
                    method,
                    Some(value),
                    "nullable results must be `Option<_>`"
                ));
            }
            let multiplicity = if *nullable { Multiplicity::Optional } else { Multiplicity::Single };
            (multiplicity, resolve_row(model, method, declared_row)?)
        }
        None => {
            if let Some(item) = types::generic_arg(value, "Vec") {
                (Multiplicity::List, infer_row(model, item)?)
            } else if let Some(inner) = types::generic_arg(value, "Option") {
                (Multiplicity::Optional, infer_row(model, inner)?)
            } else {
                (Multiplicity::Single, infer_row(model, value)?)
            }
        }
    };

    Ok(Shape {
        multiplicity,
        row,
        value: value.clone()
    })
}

fn read<'a>(
    model: &'a InterfaceModel,
    method: &'a Method,
    sql: &str,
    declared: Option<&ResultShape>,
    tables: &[String],
    in_transaction: bool
) -> Result<Category<'a>, GenerateError> {
    let query = bind::resolve(method, sql)?;
    match query.template().kind() {
        StatementKind::Select | StatementKind::Other => {}
        _ => return Err(unclassifiable(method, "read queries must be SELECT statements"))
    }
    let tables = if tables.is_empty() { query.template().tables() } else { tables.to_vec() };
    Ok(Category::Read(Read {
        shape: shape(model, method, declared)?,
        query,
        tables,
        in_transaction
    }))
}

fn write<'a>(method: &'a Method, sql: &str) -> Result<Category<'a>, GenerateError> {
    let query = bind::resolve(method, sql)?;
    let kind = query.template().kind();
    if kind == StatementKind::Select {
        return Err(unclassifiable(method, "SELECT statements must be read queries"));
    }
    let result = match &method.returns {
        None => WriteResult::Unit,
        Some(ty) if kind == StatementKind::Insert && types::is_row_id(ty) => WriteResult::RowId,
        Some(ty) if types::is_integer(ty) => WriteResult::Count(ty.clone()),
        Some(ty) => {
            return Err(unsupported_return(
                method,
                Some(ty),
                "write queries return nothing, a row count or an inserted row id"
            ));
        }
    };
    let tables = query.template().tables();
    Ok(Category::Write(Write {
        query,
        result,
        tables
    }))
}

fn shortcut<'a>(
    model: &'a InterfaceModel,
    method: &'a Method,
    op: ShortcutOp,
    targets: &'a [ShortcutTarget]
) -> Result<Category<'a>, GenerateError> {
    if targets.is_empty() {
        return Err(unclassifiable(method, "shortcut has no entity parameters"));
    }

    let mut resolved = Vec::with_capacity(targets.len());
    for target in targets {
        let Some(param) = method.params.iter().find(|p| p.name == target.param) else {
            return Err(unclassifiable(
                method,
                format!("target `{}` is not a parameter", target.param)
            ));
        };
        let entity = find_entity(model, method, &target.entity)?;
        if entity.fields.is_empty() {
            return Err(unclassifiable(method, format!("entity `{}` has no fields", entity.name)));
        }
        let table = match &entity.projection_of {
            Some(full) => find_entity(model, method, full)?.table.as_str(),
            None => entity.table.as_str()
        };
        if op.needs_key() && !entity.has_complete_key() {
            return Err(GenerateError::MissingPrimaryKey {
                method: method.name.to_string(),
                entity: entity.name.to_string()
            });
        }
        resolved.push(Target {
            param,
            entity,
            table,
            many: target.many
        });
    }

    let result = shortcut_result(method, op, &resolved)?;
    Ok(Category::Shortcut(Shortcut {
        op,
        targets: resolved,
        result
    }))
}

fn shortcut_result(method: &Method, op: ShortcutOp, targets: &[Target<'_>]) -> Result<ShortcutResult, GenerateError> {
    let Some(ty) = &method.returns else {
        return Ok(ShortcutResult::Unit);
    };
    let single = match targets {
        [only] => Some(only.many),
        _ => None
    };
    match op {
        ShortcutOp::Insert(_) | ShortcutOp::Upsert => {
            if single == Some(false) && types::is_row_id(ty) {
                return Ok(ShortcutResult::RowId);
            }
            if single == Some(true) && types::generic_arg(ty, "Vec").is_some_and(types::is_row_id) {
                return Ok(ShortcutResult::RowIds);
            }
            Err(unsupported_return(
                method,
                Some(ty),
                "inserts return nothing, `i64` for one entity or `Vec<i64>` for one collection"
            ))
        }
        ShortcutOp::Delete | ShortcutOp::Update(_) => {
            if types::is_integer(ty) {
                return Ok(ShortcutResult::Count(ty.clone()));
            }
            Err(unsupported_return(method, Some(ty), "deletes and updates return nothing or a row count"))
        }
    }
}

fn raw<'a>(
    model: &'a InterfaceModel,
    method: &'a Method,
    param: Option<&syn::Ident>,
    declared: Option<&ResultShape>,
    tables: &[String]
) -> Result<Category<'a>, GenerateError> {
    if method.concurrency == Concurrency::Stream && tables.is_empty() {
        return Err(GenerateError::UnsupportedConcurrency {
            method:      method.name.to_string(),
            category:    "unobserved raw query",
            concurrency: concurrency_name(method.concurrency)
        });
    }
    let param = param.and_then(|name| method.params.iter().find(|p| &p.name == name));
    let source = match param {
        Some(p) if types::is_sql_text(&p.ty) => RawSource::Literal(p),
        Some(p) => match types::sql_query(&p.ty) {
            Some(true) => RawSource::Borrowed(p),
            Some(false) => RawSource::Owned(p),
            None => RawSource::Fallback
        },
        None => RawSource::Fallback
    };
    Ok(Category::Raw(Raw {
        source,
        shape: shape(model, method, declared)?,
        tables: tables.to_vec()
    }))
}

fn delegate<'a>(
    model: &'a InterfaceModel,
    method: &'a Method,
    target: &syn::Ident
) -> Result<Category<'a>, GenerateError> {
    let reject = |reason| GenerateError::UnknownDelegate {
        method: method.name.to_string(),
        target: target.to_string(),
        reason
    };
    let found = model.find_method(target).ok_or_else(|| reject("no such method"))?;
    if found.name == method.name {
        return Err(reject("a method cannot delegate to itself"));
    }
    if found.concurrency != Concurrency::Direct {
        return Err(reject("the target must be a direct method"));
    }
    if matches!(found.kind, MethodKind::Delegate { .. }) {
        return Err(reject("the target is a delegate itself"));
    }
    if found.params.len() != method.params.len() {
        return Err(reject("parameter counts differ"));
    }
    Ok(Category::Delegate {
        target: found
    })
}

#[cfg(test)]
mod tests {
    use syn::parse_quote;

    use super::*;
    use crate::model::Field;

    fn model() -> InterfaceModel {
        let user = Entity::new("User", "users")
            .field(Field::new("id", "id"))
            .field(Field::new("name", "name"))
            .primary_key(["id"]);
        let name = Entity::new("UserName", "users")
            .field(Field::new("id", "id"))
            .field(Field::new("name", "name"))
            .primary_key(["id"])
            .projection_of("User");
        let log = Entity::new("Log", "logs").field(Field::new("line", "line"));
        InterfaceModel::new("Dao").entity(user).entity(name).entity(log)
    }

    fn classify_one(model: &InterfaceModel, method: Method) -> Result<&'static str, String> {
        let model = model.clone().method(method);
        let method = &model.methods[0];
        classify(&model, method)
            .map(|c| c.category.tag())
            .map_err(|e| e.to_string())
    }

    #[test]
    fn read_shapes_are_inferred_from_the_return_type() {
        let model = model();
        let cases: [(Type, Multiplicity, bool); 4] = [
            (parse_quote!(User), Multiplicity::Single, true),
            (parse_quote!(Option<User>), Multiplicity::Optional, true),
            (parse_quote!(Vec<User>), Multiplicity::List, true),
            (parse_quote!(Option<i64>), Multiplicity::Optional, false),
        ];
        for (ty, expected, is_entity) in cases {
            let method = Method::new("q", MethodKind::read("SELECT * FROM users")).returns(ty);
            let found = shape(&model, &method, None).unwrap();
            assert_eq!(found.multiplicity, expected);
            assert_eq!(matches!(found.row, Row::Entity(_)), is_entity);
        }
    }

    #[test]
    fn read_without_return_is_rejected() {
        let err = classify_one(&model(), Method::new("q", MethodKind::read("SELECT 1"))).unwrap_err();
        assert!(err.contains("must return a value"));
    }

    #[test]
    fn unknown_row_entity_is_reported() {
        let kind = MethodKind::read("SELECT 1").with_shape(ResultShape::Single {
            row:      RowShape::Entity(crate::model::ident("Post")),
            nullable: false
        });
        let method = Method::new("q", kind).returns(parse_quote!(Post));
        let err = classify_one(&model(), method).unwrap_err();
        assert!(err.contains("unknown entity `Post`"));
    }

    #[test]
    fn explicit_list_shape_needs_vec() {
        let kind = MethodKind::read("SELECT id FROM users").with_shape(ResultShape::List {
            row: RowShape::Scalar(parse_quote!(i64))
        });
        let method = Method::new("ids", kind).returns(parse_quote!(i64));
        assert!(classify_one(&model(), method).is_err());
    }

    #[test]
    fn read_tables_are_scanned() {
        let model = model().method(
            Method::new("q", MethodKind::read("SELECT * FROM users JOIN logs ON 1"))
                .returns(parse_quote!(Vec<User>))
        );
        let Category::Read(read) = classify(&model, &model.methods[0]).unwrap().category else {
            panic!("expected read");
        };
        assert_eq!(read.tables, ["users", "logs"]);
    }

    #[test]
    fn write_results() {
        let model = model();
        let insert = Method::new("add", MethodKind::write("INSERT INTO logs VALUES ('x')"))
            .returns(parse_quote!(i64));
        let model_with = model.clone().method(insert);
        let Category::Write(write) = classify(&model_with, &model_with.methods[0])
            .unwrap()
            .category
        else {
            panic!("expected write");
        };
        assert!(matches!(write.result, WriteResult::RowId));
        assert_eq!(write.tables, ["logs"]);

        let delete = Method::new("clear", MethodKind::write("DELETE FROM logs")).returns(parse_quote!(i32));
        assert_eq!(classify_one(&model, delete), Ok("write query"));

        let select = Method::new("bad", MethodKind::write("SELECT 1"));
        assert!(classify_one(&model, select).unwrap_err().contains("cannot be classified"));
    }

    #[test]
    fn shortcut_checks() {
        let model = model();
        let no_targets = Method::new("ins", MethodKind::insert(Vec::new(), ConflictPolicy::Abort));
        assert!(classify_one(&model, no_targets).unwrap_err().contains("no entity parameters"));

        let no_key = Method::new("del", MethodKind::delete([ShortcutTarget::new("log", "Log")]))
            .param(Parameter::new("log", parse_quote!(Log)));
        assert!(classify_one(&model, no_key).unwrap_err().contains("no primary key"));

        let ids = Method::new(
            "ins",
            MethodKind::insert([ShortcutTarget::new("users", "User").many()], ConflictPolicy::Abort)
        )
        .param(Parameter::new("users", parse_quote!(Vec<User>)))
        .returns(parse_quote!(Vec<i64>));
        assert_eq!(classify_one(&model, ids), Ok("insert"));

        let wrong = Method::new("ins", MethodKind::insert([ShortcutTarget::new("user", "User")], ConflictPolicy::Abort))
            .param(Parameter::new("user", parse_quote!(User)))
            .returns(parse_quote!(Vec<i64>));
        assert!(classify_one(&model, wrong).is_err());
    }

    #[test]
    fn projection_writes_into_full_table() {
        let model = model().method(
            Method::new("rename", MethodKind::update([ShortcutTarget::new("n", "UserName")], ConflictPolicy::Abort))
                .param(Parameter::new("n", parse_quote!(UserName)))
        );
        let Category::Shortcut(shortcut) = classify(&model, &model.methods[0]).unwrap().category else {
            panic!("expected shortcut");
        };
        assert_eq!(shortcut.targets[0].table, "users");
        assert_eq!(shortcut.targets[0].entity.name, "UserName");
    }

    #[test]
    fn concurrency_restrictions() {
        let model = model();
        let stream_write = Method::new("clear", MethodKind::write("DELETE FROM logs")).concurrency(Concurrency::Stream);
        assert!(classify_one(&model, stream_write).unwrap_err().contains("cannot use stream delivery"));

        let borrowed = Method::new("add", MethodKind::insert([ShortcutTarget::new("user", "User")], ConflictPolicy::Abort))
            .param(Parameter::new("user", parse_quote!(&User)))
            .concurrency(Concurrency::Future);
        assert!(classify_one(&model, borrowed).unwrap_err().contains("must be owned"));

        let borrowed_read = Method::new("find", MethodKind::read("SELECT * FROM users WHERE name = :name"))
            .param(Parameter::new("name", parse_quote!(&str)))
            .returns(parse_quote!(Option<User>))
            .concurrency(Concurrency::Future);
        assert_eq!(classify_one(&model, borrowed_read), Ok("read query"));
    }

    #[test]
    fn undeclared_converter_is_reported() {
        let method = Method::new("find", MethodKind::read("SELECT * FROM users WHERE day = :day"))
            .param(Parameter::new("day", parse_quote!(Date)).converter(parse_quote!(DateConverter)))
            .returns(parse_quote!(Vec<User>));
        let err = classify_one(&model(), method.clone()).unwrap_err();
        assert!(err.contains("converter `DateConverter`"));

        let declared = model().converter(parse_quote!(DateConverter));
        assert_eq!(classify_one(&declared, method), Ok("read query"));
    }

    #[test]
    fn raw_sources() {
        let model = model();
        let cases: [(Type, &str); 4] = [
            (parse_quote!(&str), "Literal"),
            (parse_quote!(SqlQuery), "Owned"),
            (parse_quote!(&SqlQuery), "Borrowed"),
            (parse_quote!(i64), "Fallback"),
        ];
        for (ty, expected) in cases {
            let model = model.clone().method(
                Method::new("raw", MethodKind::raw("query"))
                    .param(Parameter::new("query", ty))
                    .returns(parse_quote!(Vec<User>))
            );
            let Category::Raw(raw) = classify(&model, &model.methods[0]).unwrap().category else {
                panic!("expected raw");
            };
            assert!(format!("{:?}", raw.source).starts_with(expected));
        }
    }

    #[test]
    fn streaming_raw_query_needs_observed_tables() {
        let method = Method::new("watch", MethodKind::raw("query"))
            .param(Parameter::new("query", parse_quote!(String)))
            .returns(parse_quote!(Vec<User>))
            .concurrency(Concurrency::Stream);
        let err = classify_one(&model(), method.clone()).unwrap_err();
        assert!(err.contains("unobserved raw query methods cannot use stream delivery"));

        let observed = Method {
            kind: MethodKind::raw("query").observing(["users"]),
            ..method
        };
        assert_eq!(classify_one(&model(), observed), Ok("raw query"));
    }

    #[test]
    fn delegate_targets() {
        let model = model()
            .method(Method::new("all", MethodKind::read("SELECT * FROM users")).returns(parse_quote!(Vec<User>)))
            .method(Method::new("everyone", MethodKind::delegate("all")).returns(parse_quote!(Vec<User>)))
            .method(Method::new("loop_", MethodKind::delegate("loop_")))
            .method(Method::new("lost", MethodKind::delegate("missing")));
        assert!(classify(&model, &model.methods[1]).is_ok());
        assert!(classify(&model, &model.methods[2]).unwrap_err().to_string().contains("itself"));
        assert!(classify(&model, &model.methods[3]).unwrap_err().to_string().contains("no such method"));
    }
}
