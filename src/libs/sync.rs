//! Incremental pull queries against a remote store.
//!
//! Each round hands the last seen cursor to the remote and receives every row
//! that is not soft-deleted and was updated at or after that cursor. Hard deletes
//! are not visible to this query.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::keys::{IS_DELETED_COLUMN, UPDATED_AT_COLUMN};

/// Placeholder replaced by the ISO-8601 cursor in [`SyncQuery::template`].
pub const CURSOR_SLOT: &str = "{cursor}";

/// ISO-8601 form used for cursors: `2024-03-01T12:00:00.000Z`.
pub fn format_cursor(cursor: DateTime<Utc>) -> String {
    cursor.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncQuery {
    pub table: String,
}

impl SyncQuery {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }

    /// SQL text with the [`CURSOR_SLOT`] left open.
    pub fn template(&self) -> String {
        format!(
            "SELECT * FROM {} WHERE {IS_DELETED_COLUMN} = FALSE AND {UPDATED_AT_COLUMN} >= '{CURSOR_SLOT}'",
            self.table
        )
    }

    pub fn render(&self, cursor: DateTime<Utc>) -> String {
        self.template().replace(CURSOR_SLOT, &format_cursor(cursor))
    }

    /// PostgREST call shape, e.g. `task_thing?select=*&is_deleted=eq.false&updated_at=gte.<iso>`.
    pub fn rest_path(&self, cursor: DateTime<Utc>) -> String {
        format!(
            "{}?select=*&{IS_DELETED_COLUMN}=eq.false&{UPDATED_AT_COLUMN}=gte.{}",
            self.table,
            format_cursor(cursor)
        )
    }

    pub fn request(&self, cursor: DateTime<Utc>) -> FetchRequest {
        FetchRequest {
            table: self.table.clone(),
            filters: vec![
                Filter {
                    column: IS_DELETED_COLUMN.to_string(),
                    op: FilterOp::Eq,
                    value: Value::Bool(false),
                },
                Filter {
                    column: UPDATED_AT_COLUMN.to_string(),
                    op: FilterOp::Gte,
                    value: Value::String(format_cursor(cursor)),
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Gte,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: Value,
}

/// Structured form of one pull, handed to a [`RemoteStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub table: String,
    pub filters: Vec<Filter>,
}

/// Transport to the remote store. Implemented by the sync client.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<Value>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncBatch {
    pub rows: Vec<Value>,
    /// Latest `updated_at` among `rows`, or the cursor that was passed in.
    pub cursor: DateTime<Utc>,
}

/// Runs one pull round and advances the cursor.
pub async fn pull<S>(store: &S, query: &SyncQuery, cursor: DateTime<Utc>) -> Result<SyncBatch>
where
    S: RemoteStore + ?Sized,
{
    let rows = store.fetch(&query.request(cursor)).await?;
    let next = rows
        .iter()
        .filter_map(|row| row.get(UPDATED_AT_COLUMN)?.as_str())
        .filter_map(|text| DateTime::parse_from_rfc3339(text).ok())
        .map(|at| at.with_timezone(&Utc))
        .fold(cursor, |latest, at| latest.max(at));
    tracing::debug!(table = %query.table, rows = rows.len(), cursor = %format_cursor(next), "pulled remote rows");
    Ok(SyncBatch { rows, cursor: next })
}
