//! Loads table declarations and generator settings from a JSON manifest.
//!
//! ```json
//! {
//!   "config": { "ifNotExists": true, "types": { "Money": "integer" } },
//!   "tables": [
//!     {
//!       "tableName": "task_thing",
//!       "columns": [
//!         { "name": "id", "valueType": "String", "isPrimaryKey": true },
//!         { "name": "createdAt", "valueType": "Date?" },
//!         { "name": "otherThing", "valueType": "BlankThing", "sourceColumn": "id", "targetColumn": "blank_thing_id" }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::declaration::{ArgValue, Argument, RawColumnDeclaration, TableDeclaration};
use crate::error::{Error, Result};
use crate::generator::{Generated, Generator};
use crate::types::StorageKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorConfig {
    /// Emit `CREATE TABLE IF NOT EXISTS` rather than `CREATE TABLE`.
    pub if_not_exists: bool,
    /// Extra type tokens for the type registry.
    pub types: BTreeMap<String, StorageKind>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            if_not_exists: true,
            types: BTreeMap::new(),
        }
    }
}

#[derive(Debug)]
pub struct SchemaManifest {
    pub config: GeneratorConfig,
    /// One entry per table; a table that cannot be read keeps its error.
    pub tables: Vec<Result<TableDeclaration>>,
}

#[derive(Deserialize)]
struct RawManifest {
    #[serde(default)]
    config: GeneratorConfig,
    #[serde(default)]
    tables: Vec<Value>,
}

impl SchemaManifest {
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawManifest = serde_json::from_str(json)?;
        Ok(Self {
            config: raw.config,
            tables: raw.tables.iter().enumerate().map(|(i, t)| table(i, t)).collect(),
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn generator(&self) -> Generator {
        Generator::from_config(&self.config)
    }

    /// Expands every table; a malformed table yields a diagnostic, not an error.
    pub fn generate_all(&self) -> Vec<Generated> {
        let generator = self.generator();
        self.tables
            .iter()
            .map(|table| match table {
                Ok(declaration) => generator.expand(Ok(declaration.clone())),
                Err(Error::SchemaDeclaration { message }) => {
                    generator.expand(Err(Error::schema_declaration(message.clone())))
                }
                Err(e) => generator.expand(Err(Error::schema_declaration(e.to_string()))),
            })
            .collect()
    }
}

fn table(index: usize, value: &Value) -> Result<TableDeclaration> {
    let table_name = value
        .get("tableName")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::schema_declaration(format!("table #{index} has no `tableName`")))?
        .to_string();
    let columns = value.get("columns").and_then(Value::as_array).ok_or_else(|| {
        Error::schema_declaration(format!("table `{table_name}` has no `columns` list"))
    })?;
    Ok(TableDeclaration {
        columns: columns.iter().map(column).collect(),
        table_name,
    })
}

fn column(value: &Value) -> RawColumnDeclaration {
    let Some(object) = value.as_object() else {
        return RawColumnDeclaration::default();
    };
    let constructor = if object.contains_key("sourceColumn") {
        "ForeignKeyColumn"
    } else {
        "TableColumn"
    };
    let arguments = object
        .iter()
        .filter_map(|(label, value)| {
            let value = match (label.as_str(), value) {
                ("valueType", Value::String(s)) => ArgValue::type_token(s),
                (_, Value::String(s)) => ArgValue::Str(s.clone()),
                (_, Value::Bool(b)) => ArgValue::Bool(*b),
                (_, Value::Null) => return None,
                (_, other) => ArgValue::Other(other.to_string()),
            };
            Some(Argument::labeled(label.clone(), value))
        })
        .collect();
    RawColumnDeclaration {
        constructor: constructor.to_string(),
        arguments,
    }
}
