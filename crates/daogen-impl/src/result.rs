// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Result binder family.
//!
//! A read is lowered in two steps. [`adapt`] emits the cursor consumption
//! (query, row reads, close, return), parameterized by the handle and the
//! signal it runs with. One of four delivery wrappers then places that
//! block in the method body:
//!
//! | Concurrency | Wrapper | Runs on |
//! |-------------|---------|---------|
//! | Direct | [`direct`] | caller thread |
//! | Future | [`future`] | blocking pool, `QueryFuture` |
//! | Stream | [`stream`] | blocking pool, per invalidation |
//! | Suspend | [`suspend`] | blocking pool, callback delivery |
//!
//! The wrappers are shared with the write, shortcut, transaction and raw
//! binders: they take any [`Work`] producing `Result<V, DaoError>`.
//!
//! # Release policy
//!
//! A statement built by the method is owned and dropped on every exit
//! path ([`ReleasePolicy::Release`]). A statement borrowed from the caller
//! is only read ([`ReleasePolicy::Retain`]); asynchronous wrappers clone it
//! before moving it off the caller's thread. The cursor is closed
//! explicitly after the last row and by `Drop` on early returns.

pub mod adapt;
pub mod direct;
pub mod future;
pub mod stream;
pub mod suspend;

use proc_macro2::TokenStream;
use quote::quote;

use crate::{
    classify::{Shape, concurrency_name},
    context::Context,
    error::GenerateError,
    model::{Concurrency, Method}
};

/// Who owns the statement a read runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleasePolicy {
    /// The method owns `_statement` and drops it.
    Release,

    /// The statement belongs to the caller.
    Retain
}

/// Statement handed to a result binder.
#[derive(Debug, Clone)]
pub struct Statement {
    setup:    TokenStream,
    policy:   ReleasePolicy,
    borrowed: TokenStream
}

impl Statement {
    /// Statement declared as `_statement` by `setup`.
    pub fn owned(setup: TokenStream) -> Self {
        Self {
            setup,
            policy: ReleasePolicy::Release,
            borrowed: TokenStream::new()
        }
    }

    /// Statement borrowed from the caller as `expr: &SqlQuery`.
    pub fn borrowed(expr: TokenStream) -> Self {
        Self {
            setup:    TokenStream::new(),
            policy:   ReleasePolicy::Retain,
            borrowed: expr
        }
    }

    /// Release policy.
    pub fn policy(&self) -> ReleasePolicy {
        self.policy
    }

    /// Setup and reference for use on the caller's thread.
    fn in_place(&self) -> (TokenStream, TokenStream) {
        match self.policy() {
            ReleasePolicy::Release => (self.setup.clone(), quote!(&_statement)),
            ReleasePolicy::Retain => (TokenStream::new(), self.borrowed.clone())
        }
    }

    /// Setup and reference for use inside a `move` closure.
    fn moved(&self) -> (TokenStream, TokenStream) {
        match self.policy() {
            ReleasePolicy::Release => (self.setup.clone(), quote!(&_statement)),
            ReleasePolicy::Retain => {
                let borrowed = &self.borrowed;
                (
                    quote!(let _statement = ::std::clone::Clone::clone(#borrowed);),
                    quote!(&_statement)
                )
            }
        }
    }
}

/// Work a delivery wrapper schedules.
#[derive(Debug, Clone)]
pub struct Work {
    /// Statements run on the caller's thread first.
    pub setup:          TokenStream,
    /// Statements capturing what the closure needs from `self`.
    pub capture:        TokenStream,
    /// Closure body evaluating to `Result<V, DaoError>`.
    pub body:           TokenStream,
    /// Value type `V`.
    pub value:          TokenStream,
    /// Wrap the body in a transaction.
    pub in_transaction: bool
}

/// A read query ready for lowering.
#[derive(Debug, Clone)]
pub struct ReadRequest<'s, 'a> {
    /// Statement to run.
    pub statement:      Statement,
    /// Result shape.
    pub shape:          &'s Shape<'a>,
    /// Observed tables for streams.
    pub tables:         &'s [String],
    /// Run inside a transaction.
    pub in_transaction: bool
}

/// Lower a read into a method body for `concurrency`.
///
/// # Errors
///
/// Propagates row-adapter collisions from the registry.
pub fn bind(
    ctx: &mut Context<'_>,
    concurrency: Concurrency,
    request: ReadRequest<'_, '_>
) -> Result<TokenStream, GenerateError> {
    let row = adapt::row(ctx, &request.shape.row)?;
    let value = &request.shape.value;
    let value = quote!(#value);

    let body = match concurrency {
        Concurrency::Direct => {
            let (setup, statement) = request.statement.in_place();
            let consume = adapt::consume(ctx, adapt::Consume {
                db:        quote!(self.__db),
                statement: &statement,
                signal:    quote!(::std::option::Option::None),
                shape:     request.shape,
                row:       &row,
                streaming: false
            });
            direct::wrap(Work {
                setup,
                capture: TokenStream::new(),
                body: consume,
                value,
                in_transaction: request.in_transaction
            })
        }
        Concurrency::Future | Concurrency::Suspend => {
            let (setup, statement) = request.statement.moved();
            let consume = adapt::consume(ctx, adapt::Consume {
                db:        quote!(__db),
                statement: &statement,
                signal:    quote!(::std::option::Option::Some(_signal)),
                shape:     request.shape,
                row:       &row,
                streaming: false
            });
            let work = Work {
                setup,
                capture: capture_db(),
                body: consume,
                value,
                in_transaction: request.in_transaction
            };
            if concurrency == Concurrency::Future {
                future::wrap(ctx, work)
            } else {
                suspend::wrap(ctx, work)
            }
        }
        Concurrency::Stream => {
            let (setup, statement) = request.statement.moved();
            let consume = adapt::consume(ctx, adapt::Consume {
                db:        quote!(__db),
                statement: &statement,
                signal:    quote!(::std::option::Option::None),
                shape:     request.shape,
                row:       &row,
                streaming: true
            });
            stream::wrap(ctx, Work {
                setup,
                capture: capture_db(),
                body: consume,
                value,
                in_transaction: request.in_transaction
            }, request.tables)
        }
    };
    Ok(body)
}

/// Place `work` for a delivery kind other than streaming.
///
/// # Errors
///
/// [`GenerateError::UnsupportedConcurrency`] for streams.
pub fn deliver(
    ctx: &Context<'_>,
    method: &Method,
    category: &'static str,
    work: Work
) -> Result<TokenStream, GenerateError> {
    match method.concurrency {
        Concurrency::Direct => Ok(direct::wrap(work)),
        Concurrency::Future => Ok(future::wrap(ctx, work)),
        Concurrency::Suspend => Ok(suspend::wrap(ctx, work)),
        Concurrency::Stream => Err(GenerateError::UnsupportedConcurrency {
            method: method.name.to_string(),
            category,
            concurrency: concurrency_name(Concurrency::Stream)
        })
    }
}

/// Database handle as seen from a body delivered with `concurrency`.
pub fn handle(concurrency: Concurrency) -> TokenStream {
    match concurrency {
        Concurrency::Direct => quote!(self.__db),
        _ => quote!(__db)
    }
}

/// `let __db = Arc::clone(&self.__db);`
pub fn capture_db() -> TokenStream {
    quote!(let __db = ::std::sync::Arc::clone(&self.__db);)
}

/// Declared value type, `()` for none.
pub fn value_type(method: &Method) -> TokenStream {
    match &method.returns {
        Some(ty) => quote!(#ty),
        None => quote!(())
    }
}

#[cfg(test)]
mod tests {
    use syn::parse_quote;

    use super::*;
    use crate::{
        Options,
        classify::{Multiplicity, Row},
        model::{Entity, Field, InterfaceModel}
    };

    fn compact(tokens: &TokenStream) -> String {
        tokens.to_string().replace(' ', "")
    }

    fn user() -> Entity {
        Entity::new("User", "users").field(Field::new("id", "id"))
    }

    fn request<'s, 'a>(shape: &'s Shape<'a>, statement: Statement) -> ReadRequest<'s, 'a> {
        ReadRequest {
            statement,
            shape,
            tables: &[],
            in_transaction: false
        }
    }

    #[test]
    fn direct_single_entity() {
        let model = InterfaceModel::new("Dao");
        let mut ctx = Context::new(&model, &Options::default());
        let user = user();
        let shape = Shape {
            multiplicity: Multiplicity::Single,
            row:          Row::Entity(&user),
            value:        parse_quote!(User)
        };
        let setup = quote!(let _statement = ::daogen_core::SqlQuery::acquire("SELECT * FROM users", 0usize););
        let body = bind(&mut ctx, Concurrency::Direct, request(&shape, Statement::owned(setup))).unwrap();
        let code = compact(&body);
        assert!(code.contains("letmut_cursor=self.__db.query(&_statement,::std::option::Option::None)?;"));
        assert!(code.contains("Self::__entity_cursor_converter_user(&_cursor)?"));
        assert!(code.contains("::daogen_core::DaoError::MissingResult"));
        assert!(code.contains("_cursor.close();"));
        let (_, rows, _) = ctx.registry.into_parts();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn retained_statement_is_cloned_for_futures() {
        let model = InterfaceModel::new("Dao");
        let mut ctx = Context::new(&model, &Options::default());
        let shape = Shape {
            multiplicity: Multiplicity::List,
            row:          Row::Scalar(parse_quote!(i64)),
            value:        parse_quote!(Vec<i64>)
        };
        let statement = Statement::borrowed(quote!(query));
        assert_eq!(statement.policy(), ReleasePolicy::Retain);
        let body = bind(&mut ctx, Concurrency::Future, request(&shape, statement.clone())).unwrap();
        let code = compact(&body);
        assert!(code.starts_with("let_statement=::std::clone::Clone::clone(query);"));
        assert!(code.contains("__db.query(&_statement,::std::option::Option::Some(_signal))?"));

        let body = bind(&mut ctx, Concurrency::Direct, request(&shape, statement)).unwrap();
        assert!(compact(&body).contains("self.__db.query(query,::std::option::Option::None)?"));
    }

    #[test]
    fn stream_skips_missing_single_rows() {
        let model = InterfaceModel::new("Dao");
        let mut ctx = Context::new(&model, &Options::default());
        let shape = Shape {
            multiplicity: Multiplicity::Single,
            row:          Row::Scalar(parse_quote!(i64)),
            value:        parse_quote!(i64)
        };
        let tables = ["users".to_owned()];
        let setup = quote!(let _statement = ::daogen_core::SqlQuery::acquire("SELECT COUNT(*) FROM users", 0usize););
        let req = ReadRequest {
            statement:      Statement::owned(setup),
            shape:          &shape,
            tables:         &tables,
            in_transaction: true
        };
        let code = compact(&bind(&mut ctx, Concurrency::Stream, req).unwrap());
        assert!(code.contains("create_stream(&self.__db,true,&[\"users\"]"));
        assert!(code.contains("return::std::result::Result::Ok(::std::option::Option::None);"));
        assert!(code.contains("::std::result::Result::Ok(::std::option::Option::Some(_result))"));
    }
}
