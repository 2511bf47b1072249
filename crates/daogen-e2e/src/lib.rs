// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Interfaces, entities and helpers whose implementations `build.rs`
//! generates. The tests drive the generated types against SQLite.

use std::sync::Arc;

use daogen_core::{Database, DaoError, SqliteEngine, TypeConverter};

/// Schema shared by every test database.
pub const SCHEMA: &str = "
    CREATE TABLE users (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT,
        joined INTEGER NOT NULL
    );
    CREATE TABLE tags (
        id INTEGER PRIMARY KEY,
        label TEXT NOT NULL
    );
";

/// Days since an arbitrary epoch; stored as an integer column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Day(pub u32);

/// Stores [`Day`] as `INTEGER`.
pub struct DayConverter;

impl TypeConverter for DayConverter {
    type Value = Day;
    type Column = i64;

    fn to_column(value: &Day) -> i64 {
        i64::from(value.0)
    }

    fn from_column(column: i64) -> Day {
        Day(u32::try_from(column).unwrap_or_default())
    }
}

/// A user row.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id:     i64,
    pub name:   String,
    pub email:  Option<String>,
    pub joined: Day
}

impl User {
    /// User without an email address.
    pub fn new(id: i64, name: &str, joined: u32) -> Self {
        Self {
            id,
            name: name.to_owned(),
            email: None,
            joined: Day(joined)
        }
    }

    /// Set the email address.
    #[must_use]
    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_owned());
        self
    }
}

/// The `id` and `name` columns of a user.
#[derive(Debug, Clone, PartialEq)]
pub struct UserName {
    pub id:   i64,
    pub name: String
}

/// A tag row.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub id:    i64,
    pub label: String
}

/// Application handle accepted by [`tags::TagDaoImpl::new`].
#[derive(Clone)]
pub struct AppDatabase(pub Arc<Database>);

impl From<AppDatabase> for Arc<Database> {
    fn from(app: AppDatabase) -> Self {
        app.0
    }
}

/// In-memory database with [`SCHEMA`] applied.
///
/// # Errors
///
/// Fails when SQLite cannot be opened.
pub fn open() -> Result<Arc<Database>, DaoError> {
    let engine = SqliteEngine::open_in_memory()?;
    engine.execute_batch(SCHEMA)?;
    Ok(Arc::new(Database::new(engine)))
}

pub mod users {
    //! User access.

    use std::sync::Arc;

    use daogen_core::{DaoError, QueryFuture, QueryStream, SqlQuery, TransactionCallback};

    use crate::{Day, User, UserName};

    /// Every kind of method the compiler supports, over `users`.
    pub trait UserDao {
        fn insert(&self, user: &User) -> Result<(), DaoError>;
        fn insert_all(&self, users: &[User]) -> Result<Vec<i64>, DaoError>;
        fn add(&self, user: &User) -> Result<i64, DaoError>;
        fn add_async(&self, user: User) -> QueryFuture<i64>;
        fn rename(&self, user: &UserName) -> Result<u32, DaoError>;
        fn remove(&self, user: &User) -> Result<u32, DaoError>;
        fn remove_all(&self, users: &[User]) -> Result<u32, DaoError>;
        fn save(&self, user: &User) -> Result<i64, DaoError>;

        fn find(&self, id: i64) -> Result<User, DaoError>;
        fn find_optional(&self, id: i64) -> Result<Option<User>, DaoError>;
        fn all(&self) -> Result<Vec<User>, DaoError>;
        fn joined_on(&self, day: Day) -> Result<User, DaoError>;
        fn by_ids(&self, ids: &[i64]) -> Result<Vec<User>, DaoError>;
        fn names_since(&self, ids: Vec<i64>, since: Day) -> Result<Vec<String>, DaoError>;
        fn email_of(&self, id: i64) -> Result<Option<String>, DaoError>;
        fn count(&self) -> Result<i64, DaoError>;
        fn count_in_transaction(&self) -> Result<i64, DaoError>;
        fn count_async(&self) -> QueryFuture<i64>;
        fn watch_count(&self) -> QueryStream<i64>;
        fn watch_user(&self, id: i64) -> QueryStream<User>;
        fn find_suspend(&self, id: i64, callback: Arc<dyn TransactionCallback<User>>);

        fn add_named(&self, name: &str, joined: Day) -> Result<i64, DaoError>;
        fn set_email(&self, id: i64, email: Option<&str>) -> Result<(), DaoError>;
        fn delete_ids(&self, ids: &[i64]) -> Result<u32, DaoError>;
        fn clear(&self) -> Result<(), DaoError>;
        fn clear_async(&self) -> QueryFuture<usize>;

        fn replace_all(&self, users: Vec<User>) -> Result<(), DaoError>;
        fn replace_all_async(&self, users: Vec<User>) -> QueryFuture<()>;
        fn explode(&self, message: String, callback: Arc<dyn TransactionCallback<i64>>);

        fn query(&self, query: &SqlQuery) -> Result<Vec<User>, DaoError>;
        fn count_sql(&self, sql: &str) -> Result<i64, DaoError>;
        fn find_small(&self, id: i32) -> Result<Option<User>, DaoError>;
    }

    include!(concat!(env!("OUT_DIR"), "/user_dao.rs"));
}

pub mod tags {
    //! Tag access through an application handle.

    use daogen_core::DaoError;

    use crate::Tag;

    /// Tags, written with `INSERT OR REPLACE`.
    pub trait TagDao {
        fn put(&self, tag: &Tag) -> Result<i64, DaoError>;
        fn put_all(&self, tags: Vec<Tag>) -> Result<(), DaoError>;
        fn labels(&self) -> Result<Vec<String>, DaoError>;
        fn find_tag(&self, id: i64) -> Result<Option<Tag>, DaoError>;
        fn label_of(&self, id: i64) -> Result<Option<String>, DaoError>;
    }

    include!(concat!(env!("OUT_DIR"), "/tag_dao.rs"));
}

pub mod bodies {
    //! Transaction bodies called by generated methods.

    use daogen_core::DaoError;

    use crate::{User, users::{UserDao, UserDaoImpl}};

    /// Replace every user with `users`.
    pub fn replace_users(dao: &UserDaoImpl, users: Vec<User>) -> Result<(), DaoError> {
        dao.clear()?;
        dao.insert_all(&users)?;
        Ok(())
    }

    /// Insert a row, then fail with `message`.
    pub fn explode(dao: &UserDaoImpl, message: String) -> Result<i64, DaoError> {
        dao.add(&User::new(1000, "doomed", 0))?;
        Err(DaoError::Engine(message))
    }
}
