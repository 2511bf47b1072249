// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Entity and projection row shapes.

use syn::Ident;

use super::ident;

/// A typed row shape bound to a table.
///
/// A projection (`projection_of` set) is a partial view of another entity:
/// it carries a subset of the columns and writes go to the full entity's
/// table.
#[derive(Debug, Clone)]
pub struct Entity {
    /// Rust type name.
    pub name: Ident,

    /// Table name.
    pub table: String,

    /// Fields in struct order.
    pub fields: Vec<Field>,

    /// Field names forming the primary key.
    pub primary_key: Vec<String>,

    /// Full entity this projection belongs to.
    pub projection_of: Option<Ident>
}

impl Entity {
    /// Create an entity without fields.
    pub fn new(name: &str, table: &str) -> Self {
        Self {
            name:          ident(name),
            table:         table.to_owned(),
            fields:        Vec::new(),
            primary_key:   Vec::new(),
            projection_of: None
        }
    }

    /// Add a field.
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Set the primary key fields.
    #[must_use]
    pub fn primary_key<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>
    {
        self.primary_key = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Mark this entity as a projection of `full`.
    #[must_use]
    pub fn projection_of(mut self, full: &str) -> Self {
        self.projection_of = Some(ident(full));
        self
    }

    /// Fields that are part of the primary key, in key order.
    pub fn key_fields(&self) -> Vec<&Field> {
        self.primary_key
            .iter()
            .filter_map(|key| self.fields.iter().find(|f| f.name == key.as_str()))
            .collect()
    }

    /// Whether every key name resolves to a field.
    pub fn has_complete_key(&self) -> bool {
        !self.primary_key.is_empty() && self.key_fields().len() == self.primary_key.len()
    }

    /// Structural identity used to detect helper collisions.
    pub fn fingerprint(&self) -> String {
        let columns: Vec<&str> = self.fields.iter().map(|f| f.column.as_str()).collect();
        format!("{}({})", self.table, columns.join(","))
    }
}

/// One struct field mapped to a column.
#[derive(Debug, Clone)]
pub struct Field {
    /// Rust field name.
    pub name: Ident,

    /// Column name.
    pub column: String,

    /// Whether the field type is `Option<_>`.
    pub nullable: bool,

    /// Converter between the field type and the column type.
    pub converter: Option<syn::Path>
}

impl Field {
    /// Create a required field.
    pub fn new(name: &str, column: &str) -> Self {
        Self {
            name:      ident(name),
            column:    column.to_owned(),
            nullable:  false,
            converter: None
        }
    }

    /// Mark the field as `Option<_>`.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Convert the field through `converter`.
    #[must_use]
    pub fn converter(mut self, converter: syn::Path) -> Self {
        self.converter = Some(converter);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> Entity {
        Entity::new("User", "users")
            .field(Field::new("id", "id"))
            .field(Field::new("name", "user_name"))
            .field(Field::new("email", "email").nullable())
            .primary_key(["id"])
    }

    #[test]
    fn key_fields_resolve_names() {
        let user = user();
        assert!(user.has_complete_key());
        assert_eq!(user.key_fields()[0].column, "id");
    }

    #[test]
    fn missing_key_field_is_incomplete() {
        let user = user().primary_key(["uuid"]);
        assert!(!user.has_complete_key());
        assert!(!Entity::new("Log", "logs").has_complete_key());
    }

    #[test]
    fn fingerprint_lists_table_and_columns() {
        assert_eq!(user().fingerprint(), "users(id,user_name,email)");
    }
}
