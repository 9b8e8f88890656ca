//! Error type shared across the crate.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The table declaration has no usable columns list.
    #[error("schema declaration error: {message}")]
    SchemaDeclaration { message: String },

    #[error("manifest parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "runtime")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("database not connected")]
    NotConnected,

    #[cfg(feature = "runtime")]
    #[error("unsupported database url {url}: only sqlite is supported")]
    UnsupportedDatabase { url: String },

    #[error("remote fetch failed: {message}")]
    Remote { message: String },
}

impl Error {
    pub fn schema_declaration(message: impl Into<String>) -> Self {
        Error::SchemaDeclaration {
            message: message.into(),
        }
    }
}
