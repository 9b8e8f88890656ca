pub mod ddl;
pub mod declaration;
pub mod error;
pub mod generator;
pub mod keys;
pub mod loader;
#[cfg(feature = "runtime")]
pub mod migrate;
pub mod model;
pub mod naming;
pub mod schema;
pub mod sync;
pub mod types;

// Re-export them for easier access from the crate root
pub use ddl::*;
pub use declaration::*;
pub use error::*;
pub use generator::*;
pub use keys::*;
pub use loader::*;
#[cfg(feature = "runtime")]
pub use migrate::*;
pub use model::*;
pub use naming::*;
pub use schema::*;
pub use sync::*;
pub use types::*;
