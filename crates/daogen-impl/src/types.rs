// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Inspection of declared Rust types.

use syn::{GenericArgument, PathArguments, Type};

/// Last path segment of `ty` when it is a plain path type.
fn last_segment(ty: &Type) -> Option<&syn::PathSegment> {
    match ty {
        Type::Path(path) if path.qself.is_none() => path.path.segments.last(),
        Type::Group(group) => last_segment(&group.elem),
        Type::Paren(paren) => last_segment(&paren.elem),
        _ => None
    }
}

/// Inner type of `wrapper<T>`, e.g. `Vec<T>` or `Option<T>`.
pub fn generic_arg<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let segment = last_segment(ty)?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) if args.args.len() == 1 => Some(inner),
        _ => None
    }
}

/// Name of a bare single-identifier type such as `User` or `i64`.
pub fn simple_name(ty: &Type) -> Option<String> {
    let segment = last_segment(ty)?;
    match segment.arguments {
        PathArguments::None => Some(segment.ident.to_string()),
        _ => None
    }
}

/// Whether `ty` is a primitive integer type.
pub fn is_integer(ty: &Type) -> bool {
    const INTEGERS: &[&str] = &[
        "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128", "usize"
    ];
    simple_name(ty).is_some_and(|name| INTEGERS.contains(&name.as_str()))
}

/// Whether `ty` is exactly `i64`.
pub fn is_row_id(ty: &Type) -> bool {
    simple_name(ty).as_deref() == Some("i64")
}

/// Whether `ty` is `&str`, `String` or `&String`.
pub fn is_sql_text(ty: &Type) -> bool {
    match ty {
        Type::Reference(reference) => matches!(
            simple_name(&reference.elem).as_deref(),
            Some("str" | "String")
        ),
        other => simple_name(other).as_deref() == Some("String")
    }
}

/// Whether `ty` names the runtime `SqlQuery`, and if so whether it is
/// borrowed.
pub fn sql_query(ty: &Type) -> Option<bool> {
    match ty {
        Type::Reference(reference) if reference.mutability.is_none() => {
            (simple_name(&reference.elem).as_deref() == Some("SqlQuery")).then_some(true)
        }
        other => (simple_name(other).as_deref() == Some("SqlQuery")).then_some(false)
    }
}

#[cfg(test)]
mod tests {
    use syn::parse_quote;

    use super::*;

    #[test]
    fn generic_arguments() {
        let ty: Type = parse_quote!(Vec<User>);
        assert!(generic_arg(&ty, "Vec").is_some());
        assert!(generic_arg(&ty, "Option").is_none());
        let ty: Type = parse_quote!(::std::option::Option<i64>);
        assert_eq!(
            generic_arg(&ty, "Option").and_then(simple_name).as_deref(),
            Some("i64")
        );
    }

    #[test]
    fn integer_types() {
        assert!(is_integer(&parse_quote!(i32)));
        assert!(is_integer(&parse_quote!(usize)));
        assert!(!is_integer(&parse_quote!(f64)));
        assert!(is_row_id(&parse_quote!(i64)));
        assert!(!is_row_id(&parse_quote!(i32)));
    }

    #[test]
    fn raw_query_sources() {
        assert!(is_sql_text(&parse_quote!(&str)));
        assert!(is_sql_text(&parse_quote!(String)));
        assert!(is_sql_text(&parse_quote!(&String)));
        assert!(!is_sql_text(&parse_quote!(SqlQuery)));
        assert_eq!(sql_query(&parse_quote!(daogen_core::SqlQuery)), Some(false));
        assert_eq!(sql_query(&parse_quote!(&SqlQuery)), Some(true));
        assert_eq!(sql_query(&parse_quote!(&mut SqlQuery)), None);
        assert_eq!(sql_query(&parse_quote!(String)), None);
    }
}
