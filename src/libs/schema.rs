// schema.rs
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::declaration::{ArgValue, RawColumnDeclaration, TableDeclaration};
use crate::keys::{IS_DELETED_COLUMN, UPDATED_AT_COLUMN};
use crate::naming::{camel_to_snake, is_identifier};

/// Link from a local column to a column of another table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKey {
    /// Type name of the referenced table, e.g. `BlankThing`.
    pub source_table: String,
    /// Referenced column on `source_table`.
    pub source_column: String,
    /// Local column holding the reference.
    pub target_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    pub name: String,
    /// Declared type token with the nullability marker removed.
    pub value_type: String,
    pub is_optional: bool,
    pub is_primary_key: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKey>,
}

impl ColumnDescriptor {
    /// A plain column; a trailing `?` on `value_type` makes it optional.
    pub fn new(name: impl Into<String>, value_type: impl Into<String>) -> Self {
        let value_type = value_type.into();
        let (value_type, is_optional) = match value_type.strip_suffix('?') {
            Some(stripped) => (stripped.to_string(), true),
            None => (value_type, false),
        };
        Self {
            name: name.into(),
            value_type,
            is_optional,
            is_primary_key: false,
            foreign_key: None,
        }
    }

    /// A relationship column. `target_column` defaults to `source_column`.
    pub fn foreign_key(
        name: impl Into<String>,
        source_table: impl Into<String>,
        source_column: impl Into<String>,
        target_column: Option<&str>,
    ) -> Self {
        let source_table = source_table.into();
        let source_column = source_column.into();
        let target_column = target_column
            .map(str::to_string)
            .unwrap_or_else(|| source_column.clone());
        Self {
            name: name.into(),
            value_type: source_table.clone(),
            is_optional: true,
            is_primary_key: false,
            foreign_key: Some(ForeignKey {
                source_table,
                source_column,
                target_column,
            }),
        }
    }

    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }

    /// Marks the column as a primary key member. Ignored for foreign keys.
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = self.foreign_key.is_none();
        self
    }

    pub fn is_foreign_key(&self) -> bool {
        self.foreign_key.is_some()
    }

    /// Column name in storage: the local column for a foreign key, otherwise the
    /// snake_cased name.
    pub fn storage_key(&self) -> String {
        match &self.foreign_key {
            Some(fk) => camel_to_snake(&fk.target_column),
            None => camel_to_snake(&self.name),
        }
    }

    /// Builds a descriptor from a raw entry, or `None` when the entry has no
    /// resolvable name or value type.
    pub fn from_declaration(decl: &RawColumnDeclaration) -> Option<Self> {
        let name = decl
            .labeled("name")
            .and_then(ArgValue::as_str)
            .or_else(|| decl.positional().find_map(ArgValue::as_str))?
            .to_string();
        if name.is_empty() {
            return None;
        }

        let (value_type, is_optional) = decl
            .labeled("valueType")
            .and_then(type_of)
            .or_else(|| decl.positional().find_map(type_of))?;
        if value_type.is_empty() {
            return None;
        }

        let is_primary_key = decl
            .labeled("isPrimaryKey")
            .and_then(ArgValue::as_bool)
            .unwrap_or(false);

        let Some(source_column) = decl.labeled("sourceColumn").and_then(ArgValue::as_str) else {
            let column = Self::new(name, value_type);
            let column = if is_optional { column.optional() } else { column };
            let column = if is_primary_key { column.primary_key() } else { column };
            return column.checked();
        };

        if is_primary_key {
            tracing::debug!(column = %name, "foreign keys are never primary keys; flag ignored");
        }
        let target_column = decl.labeled("targetColumn").and_then(ArgValue::as_str);
        let column = Self::foreign_key(name, value_type, source_column, target_column);
        let fk = column.foreign_key.as_ref()?;
        if !is_identifier(&camel_to_snake(&fk.source_column)) {
            return None;
        }
        column.checked()
    }

    /// `None` when the storage key is not a usable identifier.
    fn checked(self) -> Option<Self> {
        let key = self.storage_key();
        if is_identifier(&key) {
            Some(self)
        } else {
            tracing::debug!(column = %self.name, key = %key, "storage key is not an identifier");
            None
        }
    }
}

/// Type argument as `(token, optional)`.
fn type_of(value: &ArgValue) -> Option<(String, bool)> {
    match value {
        ArgValue::Type { token, optional } => Some((token.clone(), *optional)),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    pub table_name: String,
    pub columns: Vec<ColumnDescriptor>,
}

impl TableSchema {
    pub fn new(table_name: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            table_name: table_name.into(),
            columns,
        }
    }

    /// Classifies every raw entry in declaration order.
    ///
    /// Entries without a name or type, entries whose storage key is not an
    /// identifier, and entries whose storage key is already taken (by an earlier
    /// column or by `is_deleted`/`updated_at`) are dropped; the rest of the table
    /// is still built.
    pub fn from_declaration(decl: &TableDeclaration) -> Self {
        let mut columns: Vec<ColumnDescriptor> = Vec::with_capacity(decl.columns.len());
        let mut taken: HashSet<String> =
            HashSet::from([IS_DELETED_COLUMN.to_string(), UPDATED_AT_COLUMN.to_string()]);
        for (index, raw) in decl.columns.iter().enumerate() {
            let Some(column) = ColumnDescriptor::from_declaration(raw) else {
                tracing::debug!(table = %decl.table_name, index, "skipping unclassifiable column");
                continue;
            };
            if !taken.insert(column.storage_key()) {
                tracing::warn!(
                    table = %decl.table_name,
                    column = %column.name,
                    key = %column.storage_key(),
                    "skipping column with a storage key already in use"
                );
                continue;
            }
            columns.push(column);
        }
        Self::new(decl.table_name.clone(), columns)
    }

    pub fn with_column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Plain columns marked primary, in declaration order.
    pub fn primary_key_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns
            .iter()
            .filter(|c| c.is_primary_key && !c.is_foreign_key())
    }

    pub fn foreign_keys(&self) -> impl Iterator<Item = (&ColumnDescriptor, &ForeignKey)> {
        self.columns
            .iter()
            .filter_map(|c| c.foreign_key.as_ref().map(|fk| (c, fk)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::Argument;

    fn task_thing() -> TableSchema {
        let decl = TableDeclaration::parse_str(
            r#"table_name = "task_thing", columns = [
                TableColumn("id", String, is_primary_key = true),
                TableColumn("name", String),
                TableColumn("createdAt", Date?),
                ForeignKeyColumn("otherThing", BlankThing, source_column = "id", target_column = "blank_thing_id"),
            ]"#,
            "TaskThing",
        )
        .unwrap();
        TableSchema::from_declaration(&decl)
    }

    #[test]
    fn builds_descriptors_in_declaration_order() {
        let schema = task_thing();
        let names: Vec<&str> = schema.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["id", "name", "createdAt", "otherThing"]);
        assert!(schema.columns[0].is_primary_key);
        assert!(!schema.columns[1].is_primary_key);
    }

    #[test]
    fn optional_marker_sets_is_optional() {
        let schema = task_thing();
        let created = schema.column("createdAt").unwrap();
        assert_eq!(created.value_type, "Date");
        assert!(created.is_optional);
        assert!(!schema.column("name").unwrap().is_optional);
    }

    #[test]
    fn source_column_makes_a_foreign_key() {
        let schema = task_thing();
        let other = schema.column("otherThing").unwrap();
        assert!(other.is_foreign_key());
        assert_eq!(
            other.foreign_key,
            Some(ForeignKey {
                source_table: "BlankThing".into(),
                source_column: "id".into(),
                target_column: "blank_thing_id".into(),
            })
        );
    }

    #[test]
    fn target_column_defaults_to_source_column() {
        let column = ColumnDescriptor::foreign_key("owner", "User", "id", None);
        assert_eq!(column.foreign_key.unwrap().target_column, "id");
    }

    #[test]
    fn foreign_keys_are_never_primary() {
        let decl = TableDeclaration::parse_str(
            r#"columns = [ForeignKeyColumn("owner", User, source_column = "id", is_primary_key = true)]"#,
            "Pet",
        )
        .unwrap();
        let schema = TableSchema::from_declaration(&decl);
        assert!(!schema.columns[0].is_primary_key);
        assert_eq!(schema.primary_key_columns().count(), 0);
        assert!(!ColumnDescriptor::foreign_key("o", "User", "id", None).primary_key().is_primary_key);
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let decl = TableDeclaration::parse_str(
            r#"columns = [
                TableColumn("id", String),
                TableColumn(String),
                TableColumn("noType"),
                TableColumn("", String),
                7,
                TableColumn("id", i64),
                TableColumn("count", i64),
            ]"#,
            "Thing",
        )
        .unwrap();
        let schema = TableSchema::from_declaration(&decl);
        let names: Vec<&str> = schema.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["id", "count"]);
        assert_eq!(schema.column("id").unwrap().value_type, "String");
    }

    fn names(source: &str) -> Vec<String> {
        let decl = TableDeclaration::parse_str(source, "Thing").unwrap();
        TableSchema::from_declaration(&decl)
            .columns
            .iter()
            .map(|c| c.name.clone())
            .collect()
    }

    #[test]
    fn names_sharing_a_storage_key_keep_the_first() {
        assert_eq!(
            names(r#"columns = [TableColumn("createdAt", Date?), TableColumn("created_at", String)]"#),
            ["createdAt"]
        );
    }

    #[test]
    fn foreign_key_alias_cannot_shadow_a_plain_column() {
        assert_eq!(
            names(
                r#"columns = [
                    TableColumn("blankThingId", String),
                    ForeignKeyColumn("otherThing", BlankThing, source_column = "id", target_column = "blank_thing_id"),
                ]"#
            ),
            ["blankThingId"]
        );
    }

    #[test]
    fn reserved_columns_cannot_be_redeclared() {
        assert_eq!(
            names(
                r#"columns = [
                    TableColumn("id", String),
                    TableColumn("updatedAt", Date?),
                    TableColumn("isDeleted", bool),
                    TableColumn("is_deleted", bool),
                ]"#
            ),
            ["id"]
        );
    }

    #[test]
    fn names_that_are_not_identifiers_are_skipped() {
        assert_eq!(
            names(
                r#"columns = [
                    TableColumn("id", String),
                    TableColumn("first name", String),
                    TableColumn("2nd", String),
                    ForeignKeyColumn("owner", User, source_column = "id", target_column = "owner id"),
                ]"#
            ),
            ["id"]
        );
    }

    #[test]
    fn storage_key_uses_local_column_for_foreign_keys() {
        assert_eq!(ColumnDescriptor::new("createdAt", "Date").storage_key(), "created_at");
        assert_eq!(
            ColumnDescriptor::foreign_key("otherThing", "BlankThing", "id", Some("blankThingId"))
                .storage_key(),
            "blank_thing_id"
        );
    }

    #[test]
    fn labeled_arguments_take_precedence() {
        let raw = RawColumnDeclaration {
            constructor: "TableColumn".into(),
            arguments: vec![
                Argument::labeled("name", ArgValue::Str("score".into())),
                Argument::labeled("valueType", ArgValue::type_token("f64?")),
                Argument::labeled("isPrimaryKey", ArgValue::Bool(true)),
            ],
        };
        let column = ColumnDescriptor::from_declaration(&raw).unwrap();
        assert_eq!(column.name, "score");
        assert_eq!(column.value_type, "f64");
        assert!(column.is_optional);
        assert!(column.is_primary_key);
    }

    #[test]
    fn composite_primary_key_keeps_order() {
        let schema = TableSchema::new(
            "membership",
            vec![
                ColumnDescriptor::new("teamId", "String").primary_key(),
                ColumnDescriptor::new("role", "String"),
                ColumnDescriptor::new("userId", "String").primary_key(),
            ],
        );
        let keys: Vec<&str> = schema.primary_key_columns().map(|c| c.name.as_str()).collect();
        assert_eq!(keys, ["teamId", "userId"]);
    }
}
