//! Field name ⇄ storage key mapping.

use serde::{Deserialize, Serialize};

use crate::naming::camel_to_snake;
use crate::schema::TableSchema;

/// Soft-delete flag appended to every table.
pub const IS_DELETED_FIELD: &str = "isDeleted";
pub const IS_DELETED_COLUMN: &str = "is_deleted";
/// Last-modified timestamp appended to every table.
pub const UPDATED_AT_FIELD: &str = "updatedAt";
pub const UPDATED_AT_COLUMN: &str = "updated_at";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializationKey {
    pub field: String,
    pub storage_key: String,
}

impl SerializationKey {
    fn new(field: &str) -> Self {
        Self {
            field: field.to_string(),
            storage_key: camel_to_snake(field),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SerializationKeys(Vec<SerializationKey>);

impl SerializationKeys {
    /// One entry per column, then `isDeleted` and `updatedAt`.
    ///
    /// Foreign keys are keyed by their local column, not by the relationship name.
    pub fn from_schema(schema: &TableSchema) -> Self {
        let mut keys: Vec<SerializationKey> = schema
            .columns
            .iter()
            .map(|column| match &column.foreign_key {
                Some(fk) => SerializationKey::new(&fk.target_column),
                None => SerializationKey::new(&column.name),
            })
            .collect();
        keys.push(SerializationKey::new(IS_DELETED_FIELD));
        keys.push(SerializationKey::new(UPDATED_AT_FIELD));
        Self(keys)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SerializationKey> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn storage_key(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|k| k.field == field)
            .map(|k| k.storage_key.as_str())
    }

    pub fn field(&self, storage_key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|k| k.storage_key == storage_key)
            .map(|k| k.field.as_str())
    }
}

impl<'a> IntoIterator for &'a SerializationKeys {
    type Item = &'a SerializationKey;
    type IntoIter = std::slice::Iter<'a, SerializationKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
