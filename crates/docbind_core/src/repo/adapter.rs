//! Model adapter: connection provider and record gateway.
//!
//! # Responsibility
//! - Resolve connections with per-request affinity.
//! - Translate between model instances and stored documents for
//!   get/put/post/delete.
//!
//! # Invariants
//! - A scope's bound connection is reused; a fresh one is bound at most once
//!   per scope.
//! - Null-valued fields are stripped from every document before a write.
//! - `put` replaces wholesale; fields absent from the new document do not
//!   survive.

use crate::db::driver::{ConnectOptions, Connection, StoreDriver};
use crate::db::scope::RequestScope;
use crate::db::{DbError, DbResult};
use crate::model::descriptor::Model;
use crate::model::document::{strip_absent, DocumentError};
use crate::repo::view::ViewFn;
use log::debug;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

pub type AdapterResult<T> = Result<T, AdapterError>;

/// Adapter-level error.
#[derive(Debug)]
pub enum AdapterError {
    /// Store-level failure, surfaced unchanged.
    Db(DbError),
    /// Model/document conversion failure.
    Document(DocumentError),
    /// A view name that was never registered for this model.
    UnknownView { model: &'static str, view: String },
    /// The operation needs a primary key the model does not carry.
    MissingId {
        model: &'static str,
        operation: &'static str,
    },
    /// One or more secondary indexes could not be created.
    IndexCreation(Vec<IndexFailure>),
}

/// A single failed index-creation attempt.
#[derive(Debug)]
pub struct IndexFailure {
    pub index: String,
    pub error: DbError,
}

impl Display for AdapterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Document(err) => write!(f, "{err}"),
            Self::UnknownView { model, view } => {
                write!(f, "view `{view}` for {model} does not exist")
            }
            Self::MissingId { model, operation } => {
                write!(f, "{operation} on {model} requires an id")
            }
            Self::IndexCreation(failures) => {
                write!(f, "failed to create {} index(es):", failures.len())?;
                for failure in failures {
                    write!(f, " {}: {};", failure.index, failure.error)?;
                }
                Ok(())
            }
        }
    }
}

impl Error for AdapterError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Document(err) => Some(err),
            Self::UnknownView { .. } | Self::MissingId { .. } | Self::IndexCreation(_) => None,
        }
    }
}

impl From<DbError> for AdapterError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<DocumentError> for AdapterError {
    fn from(value: DocumentError) -> Self {
        Self::Document(value)
    }
}

/// Adapter configuration.
#[derive(Clone)]
pub struct AdapterOptions {
    /// Passed through to the driver when opening connections.
    pub connect: ConnectOptions,
    /// Tolerate stale replicas when executing views.
    pub use_outdated: bool,
    /// Sort field for the default listing query.
    pub order_by: String,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            connect: ConnectOptions::default(),
            use_outdated: true,
            order_by: "id".to_string(),
        }
    }
}

/// Persistence adapter for one model type.
pub struct ModelAdapter<M: Model> {
    driver: Rc<dyn StoreDriver>,
    options: AdapterOptions,
    pub(crate) views: HashMap<String, ViewFn<M>>,
}

impl<M: Model> ModelAdapter<M> {
    pub fn new(driver: Rc<dyn StoreDriver>, options: AdapterOptions) -> Self {
        Self {
            driver,
            options,
            views: HashMap::new(),
        }
    }

    /// One-shot registration: construct, run the view-defining closure, then
    /// provision table and indexes.
    pub fn setup<F>(
        driver: Rc<dyn StoreDriver>,
        options: AdapterOptions,
        definition: F,
    ) -> AdapterResult<Self>
    where
        F: FnOnce(&mut Self),
    {
        let mut adapter = Self::new(driver, options);
        definition(&mut adapter);
        adapter.initialize(None)?;
        Ok(adapter)
    }

    pub fn options(&self) -> &AdapterOptions {
        &self.options
    }

    /// Table name, identical to the model's type name.
    pub fn table_name(&self) -> &'static str {
        M::type_name()
    }

    /// Resolves a connection with request affinity.
    ///
    /// Reuses the scope's bound connection when present; otherwise opens a
    /// fresh one and binds it to the scope. Without a scope every call opens
    /// a connection the caller must close.
    pub fn connect(&self, scope: Option<&mut RequestScope>) -> DbResult<Connection> {
        let Some(scope) = scope else {
            debug!(
                "event=connect module=repo status=ok table={} mode=unscoped",
                self.table_name()
            );
            return self.driver.connect(&self.options.connect);
        };

        if let Some(connection) = scope.connection() {
            debug!(
                "event=connect module=repo status=ok table={} mode=cached",
                self.table_name()
            );
            return Ok(connection);
        }

        let connection = self.driver.connect(&self.options.connect)?;
        scope.bind_connection(connection.clone());
        debug!(
            "event=connect module=repo status=ok table={} mode=fresh",
            self.table_name()
        );
        Ok(connection)
    }

    /// Fetches one record by primary key.
    ///
    /// An absent or empty id short-circuits to `None` without any store
    /// round trip; an absent document is `None` as well.
    pub fn get(&self, scope: Option<&mut RequestScope>, id: Option<&str>) -> AdapterResult<Option<M>> {
        let id = match id {
            Some(id) if !id.is_empty() => id,
            _ => return Ok(None),
        };

        let connection = self.connect(scope)?;
        match connection.get(self.table_name(), id)? {
            Some(doc) => Ok(Some(M::from_document(&doc)?)),
            None => Ok(None),
        }
    }

    /// Replaces the stored document for this model wholesale.
    pub fn put(&self, scope: Option<&mut RequestScope>, model: &M) -> AdapterResult<()> {
        let id = model
            .id()
            .ok_or(AdapterError::MissingId {
                model: M::type_name(),
                operation: "put",
            })?
            .to_string();

        let mut doc = model.to_document(true);
        strip_absent(&mut doc);

        let connection = self.connect(scope)?;
        connection.replace(self.table_name(), &id, doc)?;
        Ok(())
    }

    /// Inserts a new document. A model without an id adopts the
    /// store-generated key.
    pub fn post(&self, scope: Option<&mut RequestScope>, model: &mut M) -> AdapterResult<()> {
        let mut doc = model.to_document(true);
        strip_absent(&mut doc);

        let connection = self.connect(scope)?;
        let key = connection.insert(self.table_name(), doc)?;
        if model.id().is_none() {
            model.assign_id(key);
        }
        Ok(())
    }

    /// Deletes the stored document; deleting an absent document is not an
    /// error.
    pub fn delete(&self, scope: Option<&mut RequestScope>, model: &M) -> AdapterResult<()> {
        let id = model.id().ok_or(AdapterError::MissingId {
            model: M::type_name(),
            operation: "delete",
        })?;

        let connection = self.connect(scope)?;
        connection.delete(self.table_name(), id)?;
        Ok(())
    }
}
