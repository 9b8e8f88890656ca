//! The pipeline: declaration → [`TableSchema`] → [`TableArtifacts`].

use serde::{Deserialize, Serialize};

use crate::ddl::TableDefinition;
use crate::declaration::TableDeclaration;
use crate::error::Result;
use crate::keys::SerializationKeys;
use crate::loader::GeneratorConfig;
use crate::naming::camel_to_snake;
use crate::schema::TableSchema;
use crate::sync::SyncQuery;
use crate::types::TypeRegistry;

/// Guidance shown in place of generated code when a declaration has no columns list.
pub const DIAGNOSTIC_PLACEHOLDER: &str = "MARK: Add a columns list to your table declaration. \
     columns = [TableColumn(\"id\", String, is_primary_key = true), /* one entry per column */]";

/// A generated struct field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDeclaration {
    /// Field name as declared (`createdAt`), or the local column for a relationship.
    pub name: String,
    pub storage_key: String,
    pub value_type: String,
    pub is_optional: bool,
    /// Set for the local alias column of a foreign key.
    pub is_relationship: bool,
}

/// Accessor metadata for a foreign key, keyed by the relationship name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub name: String,
    pub local_column: String,
    pub source_table: String,
    pub source_column: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableArtifacts {
    pub table_name: String,
    pub serialization_keys: SerializationKeys,
    pub table_definition: TableDefinition,
    pub fields: Vec<FieldDeclaration>,
    pub relationships: Vec<Relationship>,
    pub sync_query: SyncQuery,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub placeholder: String,
    pub reason: String,
}

impl Diagnostic {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            placeholder: DIAGNOSTIC_PLACEHOLDER.to_string(),
            reason: reason.into(),
        }
    }

    /// Placeholder text followed by the reason.
    pub fn message(&self) -> String {
        format!("{} ({})", self.placeholder, self.reason)
    }
}

/// Outcome of expanding one declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Generated {
    Table(TableArtifacts),
    Diagnostic(Diagnostic),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Generator {
    registry: TypeRegistry,
    if_not_exists: bool,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new(TypeRegistry::with_defaults())
    }
}

impl Generator {
    pub fn new(registry: TypeRegistry) -> Self {
        Self {
            registry,
            if_not_exists: true,
        }
    }

    /// Default registry extended with the configured types.
    pub fn from_config(config: &GeneratorConfig) -> Self {
        let mut registry = TypeRegistry::with_defaults();
        registry.extend(config.types.iter().map(|(token, kind)| (token.clone(), *kind)));
        Self {
            registry,
            if_not_exists: config.if_not_exists,
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn generate(&self, schema: &TableSchema) -> TableArtifacts {
        let mut fields = Vec::with_capacity(schema.columns.len());
        let mut relationships = Vec::new();
        for column in &schema.columns {
            match &column.foreign_key {
                Some(fk) => {
                    fields.push(FieldDeclaration {
                        name: fk.target_column.clone(),
                        storage_key: column.storage_key(),
                        value_type: "String".to_string(),
                        is_optional: true,
                        is_relationship: true,
                    });
                    relationships.push(Relationship {
                        name: column.name.clone(),
                        local_column: camel_to_snake(&fk.target_column),
                        source_table: camel_to_snake(&fk.source_table),
                        source_column: camel_to_snake(&fk.source_column),
                    });
                }
                None => fields.push(FieldDeclaration {
                    name: column.name.clone(),
                    storage_key: column.storage_key(),
                    value_type: column.value_type.clone(),
                    is_optional: column.is_optional,
                    is_relationship: false,
                }),
            }
        }

        TableArtifacts {
            table_name: schema.table_name.clone(),
            serialization_keys: SerializationKeys::from_schema(schema),
            table_definition: TableDefinition::from_schema(schema, &self.registry)
                .if_not_exists(self.if_not_exists),
            fields,
            relationships,
            sync_query: SyncQuery::new(schema.table_name.clone()),
        }
    }

    /// Turns a declaration error into a [`Diagnostic`] instead of failing.
    pub fn expand(&self, declaration: Result<TableDeclaration>) -> Generated {
        match declaration {
            Ok(declaration) => {
                Generated::Table(self.generate(&TableSchema::from_declaration(&declaration)))
            }
            Err(e) => {
                tracing::warn!(error = %e, "emitting diagnostic placeholder");
                Generated::Diagnostic(Diagnostic::new(e.to_string()))
            }
        }
    }

    pub fn expand_str(&self, source: &str, default_name: &str) -> Generated {
        self.expand(TableDeclaration::parse_str(source, default_name))
    }
}
