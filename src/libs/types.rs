//! Declared value types and the storage kinds they map to.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Column kinds understood by the storage engine.
///
/// `Display` gives the spelling used in table definitions (`TEXT`, `DATETIME`, ...),
/// serde uses the lower-case form (`text`, `datetime`, ...).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum StorageKind {
    Text,
    Integer,
    Double,
    Real,
    Boolean,
    Blob,
    DateTime,
    /// Fallback for tokens the registry does not know.
    Any,
}

/// Maps declared type tokens to storage kinds.
///
/// Resolution never fails: a token is looked up as written, then by its last path
/// segment without generics (`chrono::DateTime<Utc>` → `DateTime`), and finally
/// falls back to [`StorageKind::Any`].
#[derive(Debug, Clone, PartialEq)]
pub struct TypeRegistry {
    kinds: HashMap<String, StorageKind>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl TypeRegistry {
    /// A registry with no entries; every token resolves to `Any`.
    pub fn empty() -> Self {
        Self {
            kinds: HashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        for (token, kind) in [
            ("String", StorageKind::Text),
            ("str", StorageKind::Text),
            ("i32", StorageKind::Integer),
            ("i64", StorageKind::Integer),
            ("u32", StorageKind::Integer),
            ("u64", StorageKind::Integer),
            ("f64", StorageKind::Double),
            ("f32", StorageKind::Real),
            ("bool", StorageKind::Boolean),
            ("Vec<u8>", StorageKind::Blob),
            ("Bytes", StorageKind::Blob),
            ("Date", StorageKind::DateTime),
            ("DateTime", StorageKind::DateTime),
            ("NaiveDateTime", StorageKind::DateTime),
            ("SystemTime", StorageKind::DateTime),
        ] {
            registry.register(token, kind);
        }
        registry
    }

    /// Adds or replaces the kind for `token`.
    pub fn register(&mut self, token: impl Into<String>, kind: StorageKind) -> &mut Self {
        self.kinds.insert(token.into(), kind);
        self
    }

    pub fn extend<I, K>(&mut self, entries: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, StorageKind)>,
        K: Into<String>,
    {
        for (token, kind) in entries {
            self.register(token, kind);
        }
        self
    }

    pub fn resolve(&self, token: &str) -> StorageKind {
        let token = token.trim().trim_end_matches('?');
        if let Some(kind) = self.kinds.get(token) {
            return *kind;
        }
        self.kinds
            .get(base_name(token))
            .copied()
            .unwrap_or(StorageKind::Any)
    }
}

/// `std::string::String` → `String`, `chrono::DateTime<chrono::Utc>` → `DateTime`.
fn base_name(token: &str) -> &str {
    let head = token.split('<').next().unwrap_or(token);
    head.rsplit("::").next().unwrap_or(head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn default_table_covers_every_kind() {
        let registry = TypeRegistry::with_defaults();
        assert_eq!(registry.resolve("String"), StorageKind::Text);
        assert_eq!(registry.resolve("i32"), StorageKind::Integer);
        assert_eq!(registry.resolve("i64"), StorageKind::Integer);
        assert_eq!(registry.resolve("f64"), StorageKind::Double);
        assert_eq!(registry.resolve("f32"), StorageKind::Real);
        assert_eq!(registry.resolve("bool"), StorageKind::Boolean);
        assert_eq!(registry.resolve("Vec<u8>"), StorageKind::Blob);
        assert_eq!(registry.resolve("Date"), StorageKind::DateTime);
    }

    #[test]
    fn unknown_tokens_fall_back_to_any() {
        let registry = TypeRegistry::with_defaults();
        assert_eq!(registry.resolve("BlankThing"), StorageKind::Any);
        assert_eq!(registry.resolve("Vec<String>"), StorageKind::Any);
        assert_eq!(registry.resolve(""), StorageKind::Any);
    }

    #[test]
    fn qualified_paths_resolve_by_last_segment() {
        let registry = TypeRegistry::with_defaults();
        assert_eq!(registry.resolve("std::string::String"), StorageKind::Text);
        assert_eq!(
            registry.resolve("chrono::DateTime<chrono::Utc>"),
            StorageKind::DateTime
        );
    }

    #[test]
    fn nullability_marker_is_ignored() {
        let registry = TypeRegistry::with_defaults();
        assert_eq!(registry.resolve("Date?"), StorageKind::DateTime);
    }

    #[test]
    fn registered_types_override_the_fallback() {
        let mut registry = TypeRegistry::with_defaults();
        registry.register("Money", StorageKind::Integer);
        registry.extend([("Uuid", StorageKind::Text)]);
        assert_eq!(registry.resolve("Money"), StorageKind::Integer);
        assert_eq!(registry.resolve("uuid::Uuid"), StorageKind::Text);
    }

    #[test]
    fn display_uses_table_definition_spelling() {
        let rendered: Vec<String> = StorageKind::iter().map(|k| k.to_string()).collect();
        assert_eq!(
            rendered,
            ["TEXT", "INTEGER", "DOUBLE", "REAL", "BOOLEAN", "BLOB", "DATETIME", "ANY"]
        );
        assert_eq!("datetime".parse::<StorageKind>().unwrap(), StorageKind::DateTime);
    }
}
