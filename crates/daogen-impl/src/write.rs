// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Write query binder.
//!
//! A write whose template has a fixed slot count is prepared once: the
//! implementation holds a `SharedStatement` and each direct call leases
//! it. Asynchronous calls take an owned copy since the lease stays on the
//! caller's thread. Templates with an expandable parameter are rebuilt per
//! call.
//!
//! Every write names the tables it touches so streams over them re-run even
//! when the engine's own change tracking misses the write, as with SQLite's
//! truncate optimization for `DELETE FROM t`.

use proc_macro2::TokenStream;
use quote::quote;

use crate::{
    bind::StatementSource,
    classify::{Write, WriteResult},
    context::Context,
    error::GenerateError,
    model::{Concurrency, Method},
    registry::prepared_statement,
    result::{self, Work}
};

/// Lower a write query into a method body.
///
/// # Errors
///
/// Propagates registry collisions and unsupported delivery kinds.
pub fn lower(ctx: &mut Context<'_>, method: &Method, write: &Write<'_>) -> Result<TokenStream, GenerateError> {
    let query = &write.query;
    let prepared = if query.is_expandable() {
        None
    } else {
        Some(prepared_statement(
            ctx,
            &method.name,
            &query.positional_sql(),
            query.arg_count()
        )?)
    };
    let source = match (&prepared, method.concurrency) {
        (None, _) => StatementSource::Fresh,
        (Some(field), Concurrency::Direct) => StatementSource::Shared(field),
        (Some(field), _) => StatementSource::SharedCopy(field)
    };
    let setup = query.emit(ctx, source);

    let rt = &ctx.runtime;
    let db = result::handle(method.concurrency);
    let tables = &write.tables;
    let body = match &write.result {
        WriteResult::Unit => quote! {
            #db.execute_on(&_statement, &[#(#tables),*])?;
            ::std::result::Result::Ok(())
        },
        WriteResult::Count(ty) => quote! {
            let _result = #db.execute_on(&_statement, &[#(#tables),*])?;
            #rt::row_count::<#ty>(_result)
        },
        WriteResult::RowId => quote! {
            let _result = #db.execute_insert_on(&_statement, &[#(#tables),*])?;
            ::std::result::Result::Ok(_result)
        }
    };

    result::deliver(ctx, method, "write query", Work {
        setup,
        capture: result::capture_db(),
        body,
        value: result::value_type(method),
        in_transaction: false
    })
}

#[cfg(test)]
mod tests {
    use syn::parse_quote;

    use super::*;
    use crate::{
        Options,
        classify::{Category, classify},
        model::{InterfaceModel, MethodKind, Parameter}
    };

    fn compact(tokens: &TokenStream) -> String {
        tokens.to_string().replace(' ', "")
    }

    fn lower_one(model: &InterfaceModel, name: &str) -> (String, Vec<String>) {
        let method = model.find_method(&crate::model::ident(name)).unwrap();
        let classified = classify(model, method).unwrap();
        let Category::Write(write) = &classified.category else {
            panic!("not a write query")
        };
        let mut ctx = Context::new(model, &Options::default());
        let body = lower(&mut ctx, method, write).unwrap();
        let fields = ctx
            .registry
            .fields()
            .iter()
            .map(|f| f.ident.to_string())
            .collect();
        (compact(&body), fields)
    }

    #[test]
    fn direct_write_leases_prepared_statement() {
        let model = InterfaceModel::new("Dao").method(
            Method::new("rename", MethodKind::write("UPDATE users SET name = :name WHERE id = :id"))
                .param(Parameter::new("id", parse_quote!(i64)))
                .param(Parameter::new("name", parse_quote!(&str)))
                .returns(parse_quote!(u32))
        );
        let (code, fields) = lower_one(&model, "rename");
        assert_eq!(fields, ["__prepared_stmt_of_rename"]);
        assert!(code.starts_with("letmut_statement=self.__prepared_stmt_of_rename.acquire();"));
        assert!(code.contains("_statement.bind(1usize,&name);_statement.bind(2usize,&id);"));
        assert!(code.ends_with(
            "let_result=self.__db.execute_on(&_statement,&[\"users\"])?;::daogen_core::row_count::<u32>(_result)"
        ));
    }

    #[test]
    fn async_write_copies_prepared_statement() {
        let model = InterfaceModel::new("Dao").method(
            Method::new("add", MethodKind::write("INSERT INTO tags(name) VALUES (?)"))
                .param(Parameter::new("name", parse_quote!(String)))
                .returns(parse_quote!(i64))
                .concurrency(Concurrency::Future)
        );
        let (code, _) = lower_one(&model, "add");
        assert!(code.starts_with("letmut_statement=self.__prepared_stmt_of_add.new_query();"));
        assert!(code.contains("::daogen_core::create_future(&self.__db,false,"));
        assert!(code.contains("let_result=__db.execute_insert_on(&_statement,&[\"tags\"])?;"));
    }

    #[test]
    fn expandable_write_is_rebuilt_per_call() {
        let model = InterfaceModel::new("Dao").method(
            Method::new("purge", MethodKind::write("DELETE FROM users WHERE id IN (:ids)"))
                .param(Parameter::new("ids", parse_quote!(Vec<i64>)).multiple())
        );
        let (code, fields) = lower_one(&model, "purge");
        assert!(fields.is_empty());
        assert!(code.contains("::daogen_core::append_placeholders(&mut_string_builder,_input_size_1);"));
        assert!(code.ends_with("self.__db.execute_on(&_statement,&[\"users\"])?;::std::result::Result::Ok(())"));
    }
}
