//! Request-scoped connection affinity and teardown.
//!
//! # Responsibility
//! - Carry one cached connection plus ambient data for the duration of a
//!   logical request.
//! - Close the bound connection exactly once when the request completes.
//!
//! # Invariants
//! - Only one of the two completion signals takes effect; the rest are
//!   no-ops.
//! - A scope dropped without completing closes its connection itself.

use crate::db::driver::Connection;
use crate::db::DbResult;
use crate::model::document::Document;
use log::{debug, error, info, warn};
use serde_json::Value;

/// Request-completion signals, mutually exclusive per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionSignal {
    /// The response was delivered.
    Finish,
    /// The request was aborted before delivery.
    Close,
}

impl CompletionSignal {
    fn as_str(self) -> &'static str {
        match self {
            Self::Finish => "finish",
            Self::Close => "close",
        }
    }
}

/// Ambient per-request data exposed to views (for example the current actor
/// identity).
#[derive(Debug, Clone, Default)]
pub struct RequestData {
    values: Document,
}

impl RequestData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }
}

/// Explicit request/session scope.
///
/// The adapter takes `Option<&mut RequestScope>` on every operation; passing
/// the same scope gives all operations in one request the same connection.
/// Passing `None` opens a fresh connection per call which the caller must
/// close.
#[derive(Default)]
pub struct RequestScope {
    connection: Option<Connection>,
    pub data: RequestData,
    completed: bool,
}

impl RequestScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: RequestData) -> Self {
        Self {
            connection: None,
            data,
            completed: false,
        }
    }

    /// Whether a connection is currently bound.
    pub fn has_connection(&self) -> bool {
        self.connection.is_some()
    }

    pub(crate) fn connection(&self) -> Option<Connection> {
        self.connection.clone()
    }

    pub(crate) fn bind_connection(&mut self, connection: Connection) {
        debug!("event=scope_bind module=db status=ok");
        self.connection = Some(connection);
    }

    /// Handles a request-completion signal, closing the bound connection the
    /// first time and ignoring every later signal.
    pub fn complete(&mut self, signal: CompletionSignal) -> DbResult<()> {
        if self.completed {
            debug!(
                "event=scope_complete module=db status=skip signal={} reason=already_completed",
                signal.as_str()
            );
            return Ok(());
        }
        self.completed = true;

        if let Some(connection) = self.connection.take() {
            connection.close()?;
            info!(
                "event=scope_complete module=db status=ok signal={} closed=true",
                signal.as_str()
            );
        } else {
            debug!(
                "event=scope_complete module=db status=ok signal={} closed=false",
                signal.as_str()
            );
        }
        Ok(())
    }

    /// Shorthand for `complete(CompletionSignal::Finish)`.
    pub fn finish(&mut self) -> DbResult<()> {
        self.complete(CompletionSignal::Finish)
    }
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        if let Some(connection) = self.connection.take() {
            warn!("event=scope_drop module=db status=warn reason=uncompleted_scope");
            if let Err(err) = connection.close() {
                error!("event=scope_drop module=db status=error error={err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CompletionSignal, RequestData, RequestScope};
    use crate::db::driver::{ConnectOptions, StoreDriver};
    use crate::db::memory::MemoryDriver;
    use serde_json::json;

    #[test]
    fn duplicate_completion_signals_are_no_ops() {
        let driver = MemoryDriver::new();
        let conn = driver.connect(&ConnectOptions::default()).unwrap();

        let mut scope = RequestScope::new();
        scope.bind_connection(conn.clone());

        scope.complete(CompletionSignal::Finish).unwrap();
        assert!(!scope.has_connection());

        // The connection was closed by the first signal; a second close
        // attempt would error, so these must not reach it.
        scope.complete(CompletionSignal::Close).unwrap();
        scope.finish().unwrap();
        assert!(conn.close().is_err());
    }

    #[test]
    fn completing_an_unbound_scope_is_fine() {
        let mut scope = RequestScope::new();
        scope.finish().unwrap();
    }

    #[test]
    fn request_data_round_trips() {
        let mut data = RequestData::new();
        data.set("user", json!(1));

        let scope = RequestScope::with_data(data);
        assert_eq!(scope.data.get("user"), Some(&json!(1)));
        assert_eq!(scope.data.get("missing"), None);
    }
}
