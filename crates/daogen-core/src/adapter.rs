// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Entity write adapters.
//!
//! Shortcut methods (insert, delete, update, upsert) share one adapter per
//! entity, conflict policy and operation. An adapter owns a
//! [`SharedStatement`] and a binder function that writes the entity's
//! columns into it. Each write invalidates the adapter's table, including
//! rows removed by `OR REPLACE`, which SQLite's update hook does not report.
//!
//! | Adapter | Single | Many | Returns |
//! |---------|--------|------|---------|
//! | [`InsertAdapter`] | `insert` | `insert_all` | nothing, row id, row ids |
//! | [`DeleteOrUpdateAdapter`] | `handle` | `handle_multiple` | affected rows |
//! | [`UpsertAdapter`] | `upsert` | `upsert_all` | nothing, row id, row ids |

use std::sync::Arc;

use tracing::trace;

use crate::{database::Database, error::DaoError, query::SqlQuery, shared::SharedStatement};

/// Writes the columns of `T` into a statement.
pub type Binder<T> = fn(&mut SqlQuery, &T);

/// Inserts entities of type `T`.
pub struct InsertAdapter<T> {
    db:        Arc<Database>,
    table:     String,
    statement: SharedStatement,
    binder:    Binder<T>
}

impl<T> InsertAdapter<T> {
    /// Create an adapter for the `INSERT` statement `sql` on `table`.
    pub fn new(
        db: Arc<Database>,
        table: &str,
        sql: &str,
        arg_count: usize,
        binder: Binder<T>
    ) -> Self {
        Self {
            db,
            table: table.to_owned(),
            statement: SharedStatement::new(sql, arg_count),
            binder
        }
    }

    /// Insert one entity.
    pub fn insert(&self, entity: &T) -> Result<(), DaoError> {
        self.insert_and_return_id(entity).map(drop)
    }

    /// Insert one entity, returning its row id or `-1` when it was ignored.
    pub fn insert_and_return_id(&self, entity: &T) -> Result<i64, DaoError> {
        let mut stmt = self.statement.acquire();
        (self.binder)(&mut stmt, entity);
        self.db.execute_insert_on(&stmt, &[self.table.as_str()])
    }

    /// Insert every entity.
    pub fn insert_all<'a>(&self, entities: impl IntoIterator<Item = &'a T>) -> Result<(), DaoError>
    where
        T: 'a
    {
        for entity in entities {
            self.insert_and_return_id(entity)?;
        }
        Ok(())
    }

    /// Insert every entity, returning the row ids in input order.
    pub fn insert_and_return_ids<'a>(
        &self,
        entities: impl IntoIterator<Item = &'a T>
    ) -> Result<Vec<i64>, DaoError>
    where
        T: 'a
    {
        entities
            .into_iter()
            .map(|entity| self.insert_and_return_id(entity))
            .collect()
    }
}

impl<T> Clone for InsertAdapter<T> {
    fn clone(&self) -> Self {
        Self {
            db:        Arc::clone(&self.db),
            table:     self.table.clone(),
            statement: self.statement.clone(),
            binder:    self.binder
        }
    }
}

/// Deletes or updates entities of type `T` by primary key.
pub struct DeleteOrUpdateAdapter<T> {
    db:        Arc<Database>,
    table:     String,
    statement: SharedStatement,
    binder:    Binder<T>
}

impl<T> DeleteOrUpdateAdapter<T> {
    /// Create an adapter for the `DELETE` or `UPDATE` statement `sql` on `table`.
    pub fn new(
        db: Arc<Database>,
        table: &str,
        sql: &str,
        arg_count: usize,
        binder: Binder<T>
    ) -> Self {
        Self {
            db,
            table: table.to_owned(),
            statement: SharedStatement::new(sql, arg_count),
            binder
        }
    }

    /// Apply the statement to one entity; yields the affected row count.
    pub fn handle(&self, entity: &T) -> Result<usize, DaoError> {
        let mut stmt = self.statement.acquire();
        (self.binder)(&mut stmt, entity);
        self.db.execute_on(&stmt, &[self.table.as_str()])
    }

    /// Apply the statement to every entity; yields the total count.
    pub fn handle_multiple<'a>(
        &self,
        entities: impl IntoIterator<Item = &'a T>
    ) -> Result<usize, DaoError>
    where
        T: 'a
    {
        let mut total = 0;
        for entity in entities {
            total += self.handle(entity)?;
        }
        Ok(total)
    }
}

impl<T> Clone for DeleteOrUpdateAdapter<T> {
    fn clone(&self) -> Self {
        Self {
            db:        Arc::clone(&self.db),
            table:     self.table.clone(),
            statement: self.statement.clone(),
            binder:    self.binder
        }
    }
}

/// Inserts entities, updating them instead when the key already exists.
pub struct UpsertAdapter<T> {
    insert: InsertAdapter<T>,
    update: DeleteOrUpdateAdapter<T>
}

impl<T> UpsertAdapter<T> {
    /// Pair an insert with the update used on conflict.
    pub fn new(insert: InsertAdapter<T>, update: DeleteOrUpdateAdapter<T>) -> Self {
        Self {
            insert,
            update
        }
    }

    /// Upsert one entity.
    pub fn upsert(&self, entity: &T) -> Result<(), DaoError> {
        self.upsert_and_return_id(entity).map(drop)
    }

    /// Upsert one entity, returning the new row id, or `-1` when an
    /// existing row was updated.
    pub fn upsert_and_return_id(&self, entity: &T) -> Result<i64, DaoError> {
        match self.insert.insert_and_return_id(entity) {
            Err(err) if err.is_unique_constraint() => {
                trace!(error = %err, "insert conflicted, updating");
                self.update.handle(entity)?;
                Ok(-1)
            }
            other => other
        }
    }

    /// Upsert every entity.
    pub fn upsert_all<'a>(&self, entities: impl IntoIterator<Item = &'a T>) -> Result<(), DaoError>
    where
        T: 'a
    {
        for entity in entities {
            self.upsert_and_return_id(entity)?;
        }
        Ok(())
    }

    /// Upsert every entity, returning one id per entity in input order.
    pub fn upsert_and_return_ids<'a>(
        &self,
        entities: impl IntoIterator<Item = &'a T>
    ) -> Result<Vec<i64>, DaoError>
    where
        T: 'a
    {
        entities
            .into_iter()
            .map(|entity| self.upsert_and_return_id(entity))
            .collect()
    }
}

impl<T> Clone for UpsertAdapter<T> {
    fn clone(&self) -> Self {
        Self {
            insert: self.insert.clone(),
            update: self.update.clone()
        }
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::SqliteEngine;

    struct Tag {
        id:    i64,
        label: String
    }

    fn db() -> Arc<Database> {
        let engine = SqliteEngine::open_in_memory().unwrap();
        engine
            .execute_batch("CREATE TABLE tags (id INTEGER PRIMARY KEY, label TEXT NOT NULL)")
            .unwrap();
        Arc::new(Database::new(engine))
    }

    fn insert_adapter(db: &Arc<Database>, policy: &str) -> InsertAdapter<Tag> {
        InsertAdapter::new(
            Arc::clone(db),
            "tags",
            &format!("INSERT OR {policy} INTO `tags` (`id`,`label`) VALUES (?,?)"),
            2,
            |stmt, tag| {
                stmt.bind(1, &tag.id);
                stmt.bind(2, &tag.label);
            }
        )
    }

    fn update_adapter(db: &Arc<Database>) -> DeleteOrUpdateAdapter<Tag> {
        DeleteOrUpdateAdapter::new(
            Arc::clone(db),
            "tags",
            "UPDATE OR ABORT `tags` SET `id` = ?,`label` = ? WHERE `id` = ?",
            3,
            |stmt, tag| {
                stmt.bind(1, &tag.id);
                stmt.bind(2, &tag.label);
                stmt.bind(3, &tag.id);
            }
        )
    }

    fn label(db: &Database, id: i64) -> Option<String> {
        let mut query = SqlQuery::acquire("SELECT label FROM tags WHERE id = ?", 1);
        query.bind(1, &id);
        let mut cursor = db.query(&query, None).unwrap();
        if cursor.move_to_next().unwrap() {
            Some(cursor.get(0).unwrap())
        } else {
            None
        }
    }

    fn tag(id: i64, label: &str) -> Tag {
        Tag {
            id,
            label: label.into()
        }
    }

    #[test]
    fn insert_returns_ids_in_order() {
        let db = db();
        let adapter = insert_adapter(&db, "ABORT");
        let ids = adapter
            .insert_and_return_ids(&[tag(3, "c"), tag(9, "i")])
            .unwrap();
        assert_eq!(ids, vec![3, 9]);
    }

    #[test]
    fn ignored_insert_yields_minus_one() {
        let db = db();
        let adapter = insert_adapter(&db, "IGNORE");
        adapter.insert(&tag(1, "a")).unwrap();
        assert_eq!(adapter.insert_and_return_id(&tag(1, "b")).unwrap(), -1);
        assert_eq!(label(&db, 1).as_deref(), Some("a"));
    }

    #[test]
    fn update_counts_rows() {
        let db = db();
        insert_adapter(&db, "ABORT")
            .insert_all(&[tag(1, "a"), tag(2, "b")])
            .unwrap();
        let changed = update_adapter(&db)
            .handle_multiple(&[tag(1, "x"), tag(5, "missing")])
            .unwrap();
        assert_eq!(changed, 1);
        assert_eq!(label(&db, 1).as_deref(), Some("x"));
    }

    #[test]
    fn upsert_falls_back_to_update() {
        let db = db();
        let adapter = UpsertAdapter::new(insert_adapter(&db, "ABORT"), update_adapter(&db));
        assert_eq!(adapter.upsert_and_return_id(&tag(4, "new")).unwrap(), 4);
        assert_eq!(adapter.upsert_and_return_id(&tag(4, "newer")).unwrap(), -1);
        assert_eq!(label(&db, 4).as_deref(), Some("newer"));
    }

    #[test]
    fn abort_conflict_surfaces_unique_error() {
        let db = db();
        let adapter = insert_adapter(&db, "ABORT");
        adapter.insert(&tag(1, "a")).unwrap();
        assert!(adapter.insert(&tag(1, "b")).unwrap_err().is_unique_constraint());
    }
}
