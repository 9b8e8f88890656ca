//! `CREATE TABLE` statements derived from a [`TableSchema`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::keys::{IS_DELETED_COLUMN, UPDATED_AT_COLUMN};
use crate::naming::camel_to_snake;
use crate::schema::TableSchema;
use crate::types::{StorageKind, TypeRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferentialAction {
    Cascade,
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferentialAction::Cascade => f.write_str("CASCADE"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub table: String,
    pub column: String,
    pub on_delete: ReferentialAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnClause {
    pub name: String,
    pub kind: StorageKind,
    pub not_null: bool,
    pub references: Option<Reference>,
}

impl ColumnClause {
    pub fn new(name: impl Into<String>, kind: StorageKind) -> Self {
        Self {
            name: name.into(),
            kind,
            not_null: false,
            references: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }
}

impl fmt::Display for ColumnClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.kind)?;
        if self.not_null {
            f.write_str(" NOT NULL")?;
        }
        if let Some(r) = &self.references {
            write!(f, " REFERENCES {}({}) ON DELETE {}", r.table, r.column, r.on_delete)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub table_name: String,
    pub if_not_exists: bool,
    pub columns: Vec<ColumnClause>,
    /// Empty when no column is marked primary.
    pub primary_key: Vec<String>,
}

impl TableDefinition {
    pub fn from_schema(schema: &TableSchema, registry: &TypeRegistry) -> Self {
        let mut columns: Vec<ColumnClause> = schema
            .columns
            .iter()
            .map(|column| match &column.foreign_key {
                Some(fk) => ColumnClause {
                    references: Some(Reference {
                        table: camel_to_snake(&fk.source_table),
                        column: camel_to_snake(&fk.source_column),
                        on_delete: ReferentialAction::Cascade,
                    }),
                    ..ColumnClause::new(camel_to_snake(&fk.target_column), StorageKind::Text)
                },
                None => {
                    let clause =
                        ColumnClause::new(camel_to_snake(&column.name), registry.resolve(&column.value_type));
                    if column.is_optional { clause } else { clause.not_null() }
                }
            })
            .collect();

        columns.push(ColumnClause::new(UPDATED_AT_COLUMN, StorageKind::DateTime));
        columns.push(ColumnClause::new(IS_DELETED_COLUMN, StorageKind::Boolean).not_null());

        Self {
            table_name: schema.table_name.clone(),
            if_not_exists: true,
            columns,
            primary_key: schema
                .primary_key_columns()
                .map(|c| camel_to_snake(&c.name))
                .collect(),
        }
    }

    pub fn if_not_exists(mut self, if_not_exists: bool) -> Self {
        self.if_not_exists = if_not_exists;
        self
    }

    pub fn column(&self, name: &str) -> Option<&ColumnClause> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn to_sql(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TableDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CREATE TABLE ")?;
        if self.if_not_exists {
            f.write_str("IF NOT EXISTS ")?;
        }
        write!(f, "{} (", self.table_name)?;
        let clauses: Vec<String> = self.columns.iter().map(ToString::to_string).collect();
        f.write_str(&clauses.join(", "))?;
        if !self.primary_key.is_empty() {
            write!(f, ", PRIMARY KEY ({})", self.primary_key.join(", "))?;
        }
        f.write_str(")")
    }
}
