//! Store driver seam, connection lifecycle and reference driver.
//!
//! # Responsibility
//! - Define the minimal driver surface the adapter consumes from a document
//!   store.
//! - Manage per-request connection affinity through explicit scopes.
//!
//! # Invariants
//! - A connection bound to a scope is reused by every operation in that
//!   scope and closed exactly once, at scope completion.
//! - Driver errors surface unchanged; the adapter never retries.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod driver;
pub mod memory;
pub mod scope;

pub type DbResult<T> = Result<T, DbError>;

/// Store-level error, surfaced verbatim to callers.
#[derive(Debug)]
pub enum DbError {
    /// Opening a connection failed.
    Connect(String),
    /// Operation attempted on a closed connection.
    ConnectionClosed,
    /// The named table does not exist.
    UnknownTable(String),
    /// Creating a table that already exists.
    TableExists(String),
    /// Query against an index the table does not have.
    UnknownIndex { table: String, index: String },
    /// Insert collided with an existing primary key.
    DuplicateKey { table: String, key: String },
    /// Primary key value the store cannot address.
    InvalidKey(String),
    /// Any other driver-reported failure.
    Driver(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connect(message) => write!(f, "connection failed: {message}"),
            Self::ConnectionClosed => write!(f, "connection is closed"),
            Self::UnknownTable(table) => write!(f, "table `{table}` does not exist"),
            Self::TableExists(table) => write!(f, "table `{table}` already exists"),
            Self::UnknownIndex { table, index } => {
                write!(f, "index `{index}` does not exist on table `{table}`")
            }
            Self::DuplicateKey { table, key } => {
                write!(f, "duplicate primary key `{key}` in table `{table}`")
            }
            Self::InvalidKey(message) => write!(f, "invalid primary key: {message}"),
            Self::Driver(message) => write!(f, "{message}"),
        }
    }
}

impl Error for DbError {}
