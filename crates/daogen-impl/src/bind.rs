// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Parameter binder.
//!
//! Maps the placeholders of a SQL template to method parameters and emits
//! the code declaring and binding `_statement`.
//!
//! # Placeholder resolution
//!
//! | Placeholder | Parameter |
//! |-------------|-----------|
//! | `:name` | parameter called `name` |
//! | `?3` | third parameter |
//! | `?` | parameter after the highest `?` or `?N` so far |
//!
//! Each occurrence becomes its own positional `?` slot. A placeholder
//! without a parameter is an error; a parameter without a placeholder is
//! logged and ignored.
//!
//! # Expandable parameters
//!
//! Without an expandable parameter the SQL and the slot count are fixed
//! and the statement may be prepared once. Otherwise the SQL is rebuilt on
//! every call with exactly as many placeholders as the collection holds,
//! so a call never sees the slot layout of a previous one.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::Ident;
use tracing::warn;

use crate::{
    context::Context,
    error::GenerateError,
    model::{Method, Parameter},
    sql::{Placeholder, Section, SqlTemplate}
};

/// One piece of a resolved template.
#[derive(Debug, Clone)]
pub enum Slot<'a> {
    /// Literal SQL.
    Text(String),

    /// Placeholder bound to a parameter.
    Param(&'a Parameter)
}

/// A SQL template with every placeholder resolved to a parameter.
#[derive(Debug, Clone)]
pub struct BoundTemplate<'a> {
    template: SqlTemplate,
    slots:    Vec<Slot<'a>>
}

/// Where `_statement` comes from.
#[derive(Debug, Clone, Copy)]
pub enum StatementSource<'a> {
    /// A new `SqlQuery` per call.
    Fresh,

    /// Lease of a prepared shared statement.
    Shared(&'a Ident),

    /// Owned copy of a prepared shared statement, for moving off-thread.
    SharedCopy(&'a Ident)
}

/// Resolve the placeholders of `sql` against the parameters of `method`.
///
/// # Errors
///
/// [`GenerateError::PlaceholderWithoutParameter`] for the first
/// placeholder no parameter matches.
pub fn resolve<'a>(method: &'a Method, sql: &str) -> Result<BoundTemplate<'a>, GenerateError> {
    let template = SqlTemplate::parse(sql);
    let mut slots = Vec::with_capacity(template.sections().len());
    // Highest 1-based number taken by `?` or `?N`, as SQLite numbers them.
    let mut highest = 0_usize;
    let mut used = vec![false; method.params.len()];

    for section in template.sections() {
        let placeholder = match section {
            Section::Text(text) => {
                slots.push(Slot::Text(text.clone()));
                continue;
            }
            Section::Placeholder(placeholder) => placeholder
        };
        let position = match placeholder {
            Placeholder::Anonymous => {
                highest = highest.saturating_add(1);
                Some(highest - 1).filter(|&i| i < method.params.len())
            }
            Placeholder::Numbered(n) => {
                highest = highest.max(*n);
                n.checked_sub(1).filter(|&i| i < method.params.len())
            }
            Placeholder::Named {
                name, ..
            } => method.params.iter().position(|p| p.name == name.as_str())
        };
        let Some(position) = position else {
            return Err(GenerateError::PlaceholderWithoutParameter {
                method:      method.name.to_string(),
                placeholder: placeholder.to_string()
            });
        };
        used[position] = true;
        slots.push(Slot::Param(&method.params[position]));
    }

    for (param, used) in method.params.iter().zip(&used) {
        if !used {
            warn!(
                method = %method.name,
                param = %param.name,
                "parameter is not referenced by the query"
            );
        }
    }

    Ok(BoundTemplate {
        template,
        slots
    })
}

impl<'a> BoundTemplate<'a> {
    /// Scanned template.
    pub fn template(&self) -> &SqlTemplate {
        &self.template
    }

    /// Whether any bound parameter is expandable.
    pub fn is_expandable(&self) -> bool {
        self.params().any(|p| p.multiple)
    }

    /// Parameters in slot order, repeated per occurrence.
    pub fn params(&self) -> impl Iterator<Item = &'a Parameter> + '_ {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Param(param) => Some(*param),
            Slot::Text(_) => None
        })
    }

    /// Number of fixed slots.
    pub fn arg_count(&self) -> usize {
        self.params().count()
    }

    /// SQL with positional placeholders.
    pub fn positional_sql(&self) -> String {
        self.template.render_positional()
    }

    /// Emit code declaring `_statement` and binding every argument.
    ///
    /// Shared sources are only valid for non-expandable templates.
    pub fn emit(&self, ctx: &Context<'_>, source: StatementSource<'_>) -> TokenStream {
        if self.is_expandable() {
            self.emit_expanded(ctx)
        } else {
            self.emit_fixed(ctx, source)
        }
    }

    fn emit_fixed(&self, ctx: &Context<'_>, source: StatementSource<'_>) -> TokenStream {
        let rt = &ctx.runtime;
        let count = self.arg_count();
        let binding = if count == 0 { quote!(_statement) } else { quote!(mut _statement) };
        let init = match source {
            StatementSource::Fresh => {
                let sql = self.positional_sql();
                quote!(#rt::SqlQuery::acquire(#sql, #count))
            }
            StatementSource::Shared(field) => quote!(self.#field.acquire()),
            StatementSource::SharedCopy(field) => quote!(self.#field.new_query())
        };
        let binds = self.params().enumerate().map(|(i, param)| {
            let index = i + 1;
            let value = scalar_value(ctx, param);
            quote!(_statement.bind(#index, #value);)
        });
        quote! {
            let #binding = #init;
            #(#binds)*
        }
    }

    fn emit_expanded(&self, ctx: &Context<'_>) -> TokenStream {
        let rt = &ctx.runtime;
        let mut build = Vec::new();
        let mut sizes = Vec::new();
        let mut pending = String::new();

        for slot in &self.slots {
            match slot {
                Slot::Text(text) => pending.push_str(text),
                Slot::Param(param) if !param.multiple => pending.push('?'),
                Slot::Param(param) => {
                    if !pending.is_empty() {
                        build.push(quote!(_string_builder.push_str(#pending);));
                        pending.clear();
                    }
                    let size = format_ident!("_input_size_{}", sizes.len() + 1);
                    let name = &param.name;
                    build.push(quote! {
                        let #size = #name.len();
                        #rt::append_placeholders(&mut _string_builder, #size);
                    });
                    sizes.push(size);
                }
            }
        }
        if !pending.is_empty() {
            build.push(quote!(_string_builder.push_str(#pending);));
        }

        let fixed = self.params().filter(|p| !p.multiple).count();
        let total = self.params().count();
        let mut binds = Vec::with_capacity(total);
        for (i, param) in self.params().enumerate() {
            let advance = (i + 1 < total).then(|| quote!(_arg_index += 1;));
            if param.multiple {
                let name = &param.name;
                let item = element_value(ctx, param);
                binds.push(quote! {
                    for _item in #name.iter() {
                        _statement.bind(_arg_index, #item);
                        _arg_index += 1;
                    }
                });
            } else {
                let value = scalar_value(ctx, param);
                binds.push(quote! {
                    _statement.bind(_arg_index, #value);
                    #advance
                });
            }
        }

        quote! {
            let mut _string_builder = ::std::string::String::new();
            #(#build)*
            let _sql = _string_builder;
            let _arg_count: usize = #fixed #(+ #sizes)*;
            let mut _statement = #rt::SqlQuery::acquire(_sql, _arg_count);
            let mut _arg_index: usize = 1;
            #(#binds)*
        }
    }
}

/// Borrowed value bound for a scalar parameter.
fn scalar_value(ctx: &Context<'_>, param: &Parameter) -> TokenStream {
    let name = &param.name;
    match &param.converter {
        Some(converter) => {
            let rt = &ctx.runtime;
            quote!(&<#converter as #rt::TypeConverter>::to_column(&#name))
        }
        None => quote!(&#name)
    }
}

/// Borrowed value bound for `_item` of an expandable parameter.
fn element_value(ctx: &Context<'_>, param: &Parameter) -> TokenStream {
    match &param.converter {
        Some(converter) => {
            let rt = &ctx.runtime;
            quote!(&<#converter as #rt::TypeConverter>::to_column(_item))
        }
        None => quote!(_item)
    }
}

#[cfg(test)]
mod tests {
    use syn::parse_quote;

    use super::*;
    use crate::{
        Options,
        model::{InterfaceModel, MethodKind}
    };

    fn method(params: Vec<Parameter>) -> Method {
        params.into_iter().fold(
            Method::new("find", MethodKind::read("SELECT 1")),
            Method::param
        )
    }

    fn compact(tokens: TokenStream) -> String {
        tokens.to_string().replace(' ', "")
    }

    #[test]
    fn named_numbered_and_anonymous_resolution() {
        let method = method(vec![
            Parameter::new("a", parse_quote!(i64)),
            Parameter::new("b", parse_quote!(String)),
        ]);
        let bound = resolve(&method, "SELECT * FROM t WHERE x = :b AND y = ?1 AND z = ?").unwrap();
        let names: Vec<String> = bound.params().map(|p| p.name.to_string()).collect();
        assert_eq!(names, ["b", "a", "b"]);
        assert_eq!(
            bound.positional_sql(),
            "SELECT * FROM t WHERE x = ? AND y = ? AND z = ?"
        );
        assert_eq!(bound.arg_count(), 3);
    }

    #[test]
    fn anonymous_after_numbered_takes_the_next_number() {
        let method = method(vec![
            Parameter::new("a", parse_quote!(i64)),
            Parameter::new("b", parse_quote!(i64)),
            Parameter::new("c", parse_quote!(i64)),
        ]);
        let bound = resolve(&method, "SELECT ?2, ?, ?1").unwrap();
        let names: Vec<String> = bound.params().map(|p| p.name.to_string()).collect();
        assert_eq!(names, ["b", "c", "a"]);
        assert!(matches!(
            resolve(&method, "SELECT ?3, ?"),
            Err(GenerateError::PlaceholderWithoutParameter { .. })
        ));
    }

    #[test]
    fn missing_parameter_is_an_error() {
        let method = method(vec![Parameter::new("a", parse_quote!(i64))]);
        for sql in ["SELECT :b", "SELECT ?2", "SELECT ?, ?"] {
            assert!(matches!(
                resolve(&method, sql),
                Err(GenerateError::PlaceholderWithoutParameter { .. })
            ));
        }
    }

    #[test]
    fn fixed_statement_uses_constant_indices() {
        let model = InterfaceModel::new("Dao");
        let options = Options::default();
        let ctx = Context::new(&model, &options);
        let method = method(vec![
            Parameter::new("id", parse_quote!(i64)),
            Parameter::new("day", parse_quote!(Date)).converter(parse_quote!(DateConverter)),
        ]);
        let bound = resolve(&method, "DELETE FROM t WHERE id = :id AND day = :day").unwrap();
        let code = compact(bound.emit(&ctx, StatementSource::Fresh));
        assert!(code.contains("letmut_statement=::daogen_core::SqlQuery::acquire(\"DELETEFROMtWHEREid=?ANDday=?\",2usize)"));
        assert!(code.contains("_statement.bind(1usize,&id);"));
        assert!(code.contains("_statement.bind(2usize,&<DateConverteras::daogen_core::TypeConverter>::to_column(&day));"));
    }

    #[test]
    fn shared_statement_is_leased() {
        let model = InterfaceModel::new("Dao");
        let options = Options::default();
        let ctx = Context::new(&model, &options);
        let method = method(Vec::new());
        let bound = resolve(&method, "DELETE FROM t").unwrap();
        let field = format_ident!("__prepared_stmt_of_clear");
        let code = compact(bound.emit(&ctx, StatementSource::Shared(&field)));
        assert_eq!(code, "let_statement=self.__prepared_stmt_of_clear.acquire();");
    }

    #[test]
    fn expandable_statement_is_rebuilt() {
        let model = InterfaceModel::new("Dao");
        let options = Options::default();
        let ctx = Context::new(&model, &options);
        let method = method(vec![
            Parameter::new("ids", parse_quote!(Vec<i64>)).multiple(),
            Parameter::new("name", parse_quote!(&str)),
        ]);
        let bound = resolve(&method, "SELECT * FROM t WHERE id IN (:ids) AND name = :name").unwrap();
        assert!(bound.is_expandable());
        let code = compact(bound.emit(&ctx, StatementSource::Fresh));
        assert!(code.contains("_string_builder.push_str(\"SELECT*FROMtWHEREidIN(\");"));
        assert!(code.contains("let_input_size_1=ids.len();"));
        assert!(code.contains("append_placeholders(&mut_string_builder,_input_size_1);"));
        assert!(code.contains("_string_builder.push_str(\")ANDname=?\");"));
        assert!(code.contains("let_arg_count:usize=1usize+_input_size_1;"));
        assert!(code.contains("for_iteminids.iter(){_statement.bind(_arg_index,_item);_arg_index+=1;}"));
        assert!(code.ends_with("_statement.bind(_arg_index,&name);"));
    }
}
