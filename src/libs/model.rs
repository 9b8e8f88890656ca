use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::schema::TableSchema;
use crate::sync::SyncQuery;

/// Implemented by `#[supamodeled]` structs.
///
/// The constants are produced at expansion time from the same column list, so
/// the table definition, serialization keys and sync template always agree.
pub trait SupaModel: Serialize + DeserializeOwned {
    const TABLE_NAME: &'static str;
    const CREATE_TABLE_SQL: &'static str;
    /// `(field name, storage key)` pairs, reserved columns last.
    const SERIALIZATION_KEYS: &'static [(&'static str, &'static str)];
    const SYNC_QUERY_TEMPLATE: &'static str;

    fn schema() -> TableSchema;

    fn sync_query() -> SyncQuery {
        SyncQuery::new(Self::TABLE_NAME)
    }

    fn storage_key(field: &str) -> Option<&'static str> {
        Self::SERIALIZATION_KEYS
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, key)| *key)
    }
}
