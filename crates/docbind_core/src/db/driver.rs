//! Driver traits: the seam between the adapter and a document store.
//!
//! # Responsibility
//! - Name every store operation the adapter issues, and nothing more.
//! - Keep the adapter testable against hand-rolled stub connections.
//!
//! # Invariants
//! - `insert` returns the stored primary key, generating one when the
//!   document carried none.
//! - `replace` is a wholesale upsert: the previous document does not
//!   contribute any field to the result.
//! - `get_all` and `scan` return rows in deterministic primary-key order
//!   unless an explicit ordering says otherwise.

use crate::db::DbResult;
use crate::model::descriptor::IndexKeyFn;
use crate::model::document::Document;
use serde_json::Value;
use std::rc::Rc;

/// Connection options, passed through to the driver opaquely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub auth_key: Option<String>,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 28015,
            database: "test".to_string(),
            auth_key: None,
        }
    }
}

/// Read consistency requested for queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Serve from the authoritative replica.
    Consistent,
    /// Tolerate a potentially stale replica.
    Outdated,
}

/// Concrete index shape handed to the store at creation time.
#[derive(Debug, Clone)]
pub struct IndexDefinition {
    pub name: String,
    pub kind: IndexKind,
}

/// Index matching semantics.
#[derive(Debug, Clone)]
pub enum IndexKind {
    /// Key is the value of one field.
    Simple { field: String },
    /// Key is each element of an array-valued field.
    Multi { field: String },
    /// Key is computed from the whole document.
    Computed(IndexKeyFn),
}

/// One open session with the store.
///
/// Deliberately object-safe: the adapter holds connections as
/// [`Connection`] and never names the concrete driver type.
pub trait StoreConnection {
    fn table_list(&self) -> DbResult<Vec<String>>;
    fn table_create(&self, table: &str) -> DbResult<()>;
    fn index_create(&self, table: &str, index: IndexDefinition) -> DbResult<()>;
    fn index_list(&self, table: &str) -> DbResult<Vec<String>>;
    fn get(&self, table: &str, id: &str) -> DbResult<Option<Document>>;
    fn insert(&self, table: &str, doc: Document) -> DbResult<String>;
    fn replace(&self, table: &str, id: &str, doc: Document) -> DbResult<()>;
    fn delete(&self, table: &str, id: &str) -> DbResult<()>;
    fn get_all(
        &self,
        table: &str,
        index: &str,
        key: &Value,
        read: ReadMode,
    ) -> DbResult<Vec<Document>>;
    fn scan(&self, table: &str, order_by: &str, read: ReadMode) -> DbResult<Vec<Document>>;
    fn close(&self) -> DbResult<()>;
}

/// Shared handle to one open session.
///
/// `Rc` on purpose: the crate is single-threaded per request, and a handle
/// must never cross to another request's scope.
pub type Connection = Rc<dyn StoreConnection>;

/// Opens connections against one configured store.
pub trait StoreDriver {
    fn connect(&self, options: &ConnectOptions) -> DbResult<Connection>;
}
