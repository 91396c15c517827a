//! Persistence adapter binding an ODM model layer to a document store.
//!
//! The crate owns three things: per-request connection affinity through
//! explicit [`RequestScope`] values, table/index provisioning derived from
//! model descriptors, and CRUD plus named-view execution over the
//! [`StoreDriver`] seam. Everything below that seam belongs to the store.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use db::driver::{
    ConnectOptions, Connection, IndexDefinition, IndexKind, ReadMode, StoreConnection, StoreDriver,
};
pub use db::memory::{MemoryConnection, MemoryDriver};
pub use db::scope::{CompletionSignal, RequestData, RequestScope};
pub use db::{DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::descriptor::{
    IndexKeyFn, IndexSpec, Model, ModelDescriptor, PropertyKind, PropertySpec,
};
pub use model::document::{strip_absent, Document, DocumentError};
pub use repo::adapter::{AdapterError, AdapterOptions, AdapterResult, IndexFailure, ModelAdapter};
pub use repo::bootstrap::index_definition;
pub use repo::view::{QueryOptions, TableRef, ViewContext, ViewOutput, ViewRow, ViewRows};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
