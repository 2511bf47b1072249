// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Read query binder.

use proc_macro2::TokenStream;

use crate::{
    bind::StatementSource,
    classify::Read,
    context::Context,
    error::GenerateError,
    model::Method,
    result::{self, ReadRequest, Statement}
};

/// Lower a read query: a fresh statement per call, handed to the result
/// binder.
///
/// # Errors
///
/// Propagates row-adapter collisions.
pub fn lower(ctx: &mut Context<'_>, method: &Method, read: &Read<'_>) -> Result<TokenStream, GenerateError> {
    let setup = read.query.emit(ctx, StatementSource::Fresh);
    result::bind(ctx, method.concurrency, ReadRequest {
        statement:      Statement::owned(setup),
        shape:          &read.shape,
        tables:         &read.tables,
        in_transaction: read.in_transaction
    })
}

#[cfg(test)]
mod tests {
    use syn::parse_quote;

    use super::*;
    use crate::{
        Options,
        classify::{Category, classify},
        model::{Concurrency, Entity, Field, InterfaceModel, MethodKind, Parameter}
    };

    fn lower_one(model: &InterfaceModel) -> String {
        let method = &model.methods[0];
        let classified = classify(model, method).unwrap();
        let Category::Read(read) = &classified.category else {
            panic!("not a read query")
        };
        let mut ctx = Context::new(model, &Options::default());
        lower(&mut ctx, method, read).unwrap().to_string().replace(' ', "")
    }

    #[test]
    fn observed_tables_come_from_the_query() {
        let model = InterfaceModel::new("UserDao")
            .entity(Entity::new("User", "users").field(Field::new("id", "id")))
            .method(
                Method::new(
                    "watch",
                    MethodKind::read("SELECT u.* FROM users u JOIN teams t ON t.id = u.team WHERE t.name = :team")
                )
                .param(Parameter::new("team", parse_quote!(&str)))
                .returns(parse_quote!(Vec<User>))
                .concurrency(Concurrency::Stream)
            );
        let code = lower_one(&model);
        assert!(code.contains("_statement.bind(1usize,&team);"));
        assert!(code.contains("::daogen_core::create_stream(&self.__db,false,&[\"users\",\"teams\"],"));
    }
}
