//! Derives storage artifacts from declarative column lists.
//!
//! A table is described once, as an ordered list of column declarations, and
//! everything needed to persist and synchronize it is generated from that list:
//! serialization keys, a `CREATE TABLE` statement with primary and foreign keys,
//! and an incremental fetch query for a remote store.
//!
//! ```
//! use supamodel::{Generated, Generator};
//!
//! let generated = Generator::default().expand_str(
//!     r#"table_name = "task_thing", columns = [
//!         TableColumn("id", String, is_primary_key = true),
//!         TableColumn("createdAt", Date?),
//!     ]"#,
//!     "TaskThing",
//! );
//! let Generated::Table(artifacts) = generated else { panic!("diagnostic") };
//! assert_eq!(
//!     artifacts.table_definition.to_string(),
//!     "CREATE TABLE IF NOT EXISTS task_thing (id TEXT NOT NULL, created_at DATETIME, \
//!      updated_at DATETIME, is_deleted BOOLEAN NOT NULL, PRIMARY KEY (id))"
//! );
//! ```

mod libs;

pub use libs::*;

// Generated code refers to these through `::supamodel`.
pub use chrono;
pub use serde;
