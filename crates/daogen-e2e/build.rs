// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Generates the implementations exercised by the tests into `OUT_DIR`.

use std::{env, error::Error, fs, path::PathBuf};

use daogen_impl::{
    generate,
    model::{
        Concurrency, ConflictPolicy, Entity, Field, InterfaceModel, Method, MethodKind, Parameter,
        ShortcutTarget
    }
};
use syn::parse_quote;

fn user() -> Entity {
    Entity::new("User", "users")
        .field(Field::new("id", "id"))
        .field(Field::new("name", "name"))
        .field(Field::new("email", "email").nullable())
        .field(Field::new("joined", "joined").converter(parse_quote!(crate::DayConverter)))
        .primary_key(["id"])
}

fn user_name() -> Entity {
    Entity::new("UserName", "users")
        .field(Field::new("id", "id"))
        .field(Field::new("name", "name"))
        .primary_key(["id"])
        .projection_of("User")
}

fn one_user(name: &str) -> ShortcutTarget {
    ShortcutTarget::new(name, "User")
}

fn day(name: &str) -> Parameter {
    Parameter::new(name, parse_quote!(Day)).converter(parse_quote!(crate::DayConverter))
}

fn user_dao() -> InterfaceModel {
    InterfaceModel::new("UserDao")
        .entity(user())
        .entity(user_name())
        .converter(parse_quote!(crate::DayConverter))
        // entity shortcuts
        .method(
            Method::new("insert", MethodKind::insert([one_user("user")], ConflictPolicy::Abort))
                .param(Parameter::new("user", parse_quote!(&User)))
        )
        .method(
            Method::new("insert_all", MethodKind::insert([one_user("users").many()], ConflictPolicy::Abort))
                .param(Parameter::new("users", parse_quote!(&[User])))
                .returns(parse_quote!(Vec<i64>))
        )
        .method(
            Method::new("add", MethodKind::insert([one_user("user")], ConflictPolicy::Abort))
                .param(Parameter::new("user", parse_quote!(&User)))
                .returns(parse_quote!(i64))
        )
        .method(
            Method::new("add_async", MethodKind::insert([one_user("user")], ConflictPolicy::Abort))
                .param(Parameter::new("user", parse_quote!(User)))
                .returns(parse_quote!(i64))
                .concurrency(Concurrency::Future)
        )
        .method(
            Method::new(
                "rename",
                MethodKind::update([ShortcutTarget::new("user", "UserName")], ConflictPolicy::Abort)
            )
            .param(Parameter::new("user", parse_quote!(&UserName)))
            .returns(parse_quote!(u32))
        )
        .method(
            Method::new("remove", MethodKind::delete([one_user("user")]))
                .param(Parameter::new("user", parse_quote!(&User)))
                .returns(parse_quote!(u32))
        )
        .method(
            Method::new("remove_all", MethodKind::delete([one_user("users").many()]))
                .param(Parameter::new("users", parse_quote!(&[User])))
                .returns(parse_quote!(u32))
        )
        .method(
            Method::new("save", MethodKind::upsert([one_user("user")]))
                .param(Parameter::new("user", parse_quote!(&User)))
                .returns(parse_quote!(i64))
        )
        // read queries
        .method(
            Method::new("find", MethodKind::read("SELECT * FROM users WHERE id = :id"))
                .param(Parameter::new("id", parse_quote!(i64)))
                .returns(parse_quote!(User))
        )
        .method(
            Method::new("find_optional", MethodKind::read("SELECT * FROM users WHERE id = :id"))
                .param(Parameter::new("id", parse_quote!(i64)))
                .returns(parse_quote!(Option<User>))
        )
        .method(
            Method::new("all", MethodKind::read("SELECT * FROM users ORDER BY id")).returns(parse_quote!(Vec<User>))
        )
        .method(
            Method::new("joined_on", MethodKind::read("SELECT * FROM users WHERE joined = :day ORDER BY id"))
                .param(day("day"))
                .returns(parse_quote!(User))
        )
        .method(
            Method::new("by_ids", MethodKind::read("SELECT * FROM users WHERE id IN (:ids) ORDER BY id"))
                .param(Parameter::new("ids", parse_quote!(&[i64])).multiple())
                .returns(parse_quote!(Vec<User>))
        )
        .method(
            Method::new(
                "names_since",
                MethodKind::read("SELECT name FROM users WHERE id IN (:ids) AND joined >= :since ORDER BY name")
            )
            .param(Parameter::new("ids", parse_quote!(Vec<i64>)).multiple())
            .param(day("since"))
            .returns(parse_quote!(Vec<String>))
        )
        .method(
            Method::new("email_of", MethodKind::read("SELECT email FROM users WHERE id = ?"))
                .param(Parameter::new("id", parse_quote!(i64)))
                .returns(parse_quote!(Option<String>))
        )
        .method(Method::new("count", MethodKind::read("SELECT COUNT(*) FROM users")).returns(parse_quote!(i64)))
        .method(
            Method::new("count_in_transaction", MethodKind::read_in_transaction("SELECT COUNT(*) FROM users"))
                .returns(parse_quote!(i64))
        )
        .method(
            Method::new("count_async", MethodKind::read("SELECT COUNT(*) FROM users"))
                .returns(parse_quote!(i64))
                .concurrency(Concurrency::Future)
        )
        .method(
            Method::new("watch_count", MethodKind::read("SELECT COUNT(*) FROM users"))
                .returns(parse_quote!(i64))
                .concurrency(Concurrency::Stream)
        )
        .method(
            Method::new(
                "watch_user",
                MethodKind::read("SELECT * FROM users WHERE id = :id").observing(["users"])
            )
                .param(Parameter::new("id", parse_quote!(i64)))
                .returns(parse_quote!(User))
                .concurrency(Concurrency::Stream)
        )
        .method(
            Method::new("find_suspend", MethodKind::read("SELECT * FROM users WHERE id = :id"))
                .param(Parameter::new("id", parse_quote!(i64)))
                .returns(parse_quote!(User))
                .concurrency(Concurrency::Suspend)
        )
        // write queries
        .method(
            Method::new("add_named", MethodKind::write("INSERT INTO users (name, joined) VALUES (:name, :joined)"))
                .param(Parameter::new("name", parse_quote!(&str)))
                .param(day("joined"))
                .returns(parse_quote!(i64))
        )
        .method(
            Method::new("set_email", MethodKind::write("UPDATE users SET email = :email WHERE id = :id"))
                .param(Parameter::new("id", parse_quote!(i64)))
                .param(Parameter::new("email", parse_quote!(Option<&str>)))
        )
        .method(
            Method::new("delete_ids", MethodKind::write("DELETE FROM users WHERE id IN (:ids)"))
                .param(Parameter::new("ids", parse_quote!(&[i64])).multiple())
                .returns(parse_quote!(u32))
        )
        .method(Method::new("clear", MethodKind::write("DELETE FROM users")))
        .method(
            Method::new("clear_async", MethodKind::write("DELETE FROM users"))
                .returns(parse_quote!(usize))
                .concurrency(Concurrency::Future)
        )
        // transactions
        .method(
            Method::new("replace_all", MethodKind::transaction(parse_quote!(crate::bodies::replace_users)))
                .param(Parameter::new("users", parse_quote!(Vec<User>)))
        )
        .method(
            Method::new(
                "replace_all_async",
                MethodKind::transaction(parse_quote!(crate::bodies::replace_users))
            )
            .param(Parameter::new("users", parse_quote!(Vec<User>)))
            .concurrency(Concurrency::Future)
        )
        .method(
            Method::new("explode", MethodKind::transaction(parse_quote!(crate::bodies::explode)))
                .param(Parameter::new("message", parse_quote!(String)))
                .returns(parse_quote!(i64))
                .concurrency(Concurrency::Suspend)
        )
        // raw queries and delegates
        .method(
            Method::new("query", MethodKind::raw("query"))
                .param(Parameter::new("query", parse_quote!(&SqlQuery)))
                .returns(parse_quote!(Vec<User>))
        )
        .method(
            Method::new("count_sql", MethodKind::raw("sql"))
                .param(Parameter::new("sql", parse_quote!(&str)))
                .returns(parse_quote!(i64))
        )
        .method(
            Method::new("find_small", MethodKind::delegate("find_optional"))
                .param(Parameter::new("id", parse_quote!(i32)))
                .returns(parse_quote!(Option<User>))
        )
}

fn tag_dao() -> InterfaceModel {
    InterfaceModel::new("TagDao")
        .backing_type(parse_quote!(crate::AppDatabase))
        .entity(
            Entity::new("Tag", "tags")
                .field(Field::new("id", "id"))
                .field(Field::new("label", "label"))
                .primary_key(["id"])
        )
        .method(
            Method::new(
                "put",
                MethodKind::insert([ShortcutTarget::new("tag", "Tag")], ConflictPolicy::Replace)
            )
            .param(Parameter::new("tag", parse_quote!(&Tag)))
            .returns(parse_quote!(i64))
        )
        .method(
            Method::new(
                "put_all",
                MethodKind::insert([ShortcutTarget::new("tags", "Tag").many()], ConflictPolicy::Replace)
            )
            .param(Parameter::new("tags", parse_quote!(Vec<Tag>)))
        )
        .method(
            Method::new("labels", MethodKind::read("SELECT label FROM tags ORDER BY label"))
                .returns(parse_quote!(Vec<String>))
        )
        .method(
            Method::new("find_tag", MethodKind::read("SELECT * FROM tags WHERE id = ?"))
                .param(Parameter::new("id", parse_quote!(i64)))
                .returns(parse_quote!(Option<Tag>))
        )
        .method(
            Method::new("label_of", MethodKind::read("SELECT label FROM tags WHERE id = ?1 OR id = ?1"))
                .param(Parameter::new("id", parse_quote!(i64)))
                .returns(parse_quote!(Option<String>))
        )
}

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed=build.rs");
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    for (file, model) in [("user_dao.rs", user_dao()), ("tag_dao.rs", tag_dao())] {
        let tokens = generate(&model)?;
        fs::write(out_dir.join(file), tokens.to_string())?;
    }
    Ok(())
}
