//! Named-view registration and execution.
//!
//! # Responsibility
//! - Store named query functions per model and execute them against a
//!   pre-bound table reference.
//! - Marshal raw rows into typed model instances.
//!
//! # Invariants
//! - An unregistered view name fails before any connection is acquired.
//! - Marshaling is idempotent: an already-typed row passes through
//!   unchanged.

use crate::db::driver::{Connection, ReadMode};
use crate::db::scope::{RequestData, RequestScope};
use crate::db::DbResult;
use crate::model::descriptor::Model;
use crate::model::document::Document;
use crate::repo::adapter::{AdapterError, AdapterResult, ModelAdapter};
use serde_json::Value;

/// Opaque query options passed through to the view function.
pub type QueryOptions = Document;

/// One result row, raw or already typed.
#[derive(Debug)]
pub enum ViewRow<M> {
    Raw(Document),
    Instance(M),
}

/// What a view function produces: zero, one, or many rows.
#[derive(Debug)]
pub enum ViewRows<M> {
    None,
    One(ViewRow<M>),
    Many(Vec<ViewRow<M>>),
}

/// Marshaled view result.
#[derive(Debug)]
pub enum ViewOutput<M> {
    None,
    One(M),
    Many(Vec<M>),
}

impl<M> ViewOutput<M> {
    /// Flattens to a row vector: `None` is empty, `One` a singleton.
    pub fn into_vec(self) -> Vec<M> {
        match self {
            Self::None => Vec::new(),
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        }
    }
}

/// Invocation scope handed to a view function.
pub struct ViewContext<'a> {
    /// Table reference pre-bound to the current connection and read mode.
    pub table: TableRef,
    /// The connection every operation in this request shares.
    pub connection: &'a Connection,
    /// Ambient per-request data, absent outside a request scope.
    pub request: Option<&'a RequestData>,
}

/// A registered view function.
pub type ViewFn<M> =
    Box<dyn Fn(&ViewContext<'_>, Option<&Value>, &QueryOptions) -> AdapterResult<ViewRows<M>>>;

/// Table handle bound to one connection and read mode.
pub struct TableRef {
    name: String,
    connection: Connection,
    read: ReadMode,
}

impl TableRef {
    pub(crate) fn new(name: &str, connection: Connection, read: ReadMode) -> Self {
        Self {
            name: name.to_string(),
            connection,
            read,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn read_mode(&self) -> ReadMode {
        self.read
    }

    /// Fetch by primary key.
    pub fn get(&self, id: &str) -> DbResult<Option<Document>> {
        self.connection.get(&self.name, id)
    }

    /// All rows whose index key matches `key`, in primary-key order.
    pub fn get_all(&self, index: &str, key: &Value) -> DbResult<Vec<Document>> {
        self.connection.get_all(&self.name, index, key, self.read)
    }

    /// Full listing ordered by `field`.
    pub fn order_by(&self, field: &str) -> DbResult<Vec<Document>> {
        self.connection.scan(&self.name, field, self.read)
    }
}

impl<M: Model> ModelAdapter<M> {
    /// Registers a named view function for this model.
    pub fn define_view<F>(&mut self, name: impl Into<String>, view: F)
    where
        F: Fn(&ViewContext<'_>, Option<&Value>, &QueryOptions) -> AdapterResult<ViewRows<M>>
            + 'static,
    {
        self.views.insert(name.into(), Box::new(view));
    }

    /// Whether a view with this name is registered.
    pub fn has_view(&self, name: &str) -> bool {
        self.views.contains_key(name)
    }

    /// Executes a named view, or the default listing when `name` is `None`.
    ///
    /// The unknown-view check runs before a connection is acquired: it is a
    /// registration mistake, not a store condition, but it travels through
    /// the same `Result` channel as every other failure.
    pub fn view(
        &self,
        mut scope: Option<&mut RequestScope>,
        name: Option<&str>,
        key: Option<&Value>,
        options: &QueryOptions,
    ) -> AdapterResult<ViewOutput<M>> {
        let view = match name {
            Some(name) => Some(self.views.get(name).ok_or_else(|| {
                AdapterError::UnknownView {
                    model: M::type_name(),
                    view: name.to_string(),
                }
            })?),
            None => None,
        };

        let connection = self.connect(scope.as_deref_mut())?;
        let request = scope.as_deref().map(|scope| &scope.data);
        let read = if self.options().use_outdated {
            ReadMode::Outdated
        } else {
            ReadMode::Consistent
        };

        let context = ViewContext {
            table: TableRef::new(self.table_name(), connection.clone(), read),
            connection: &connection,
            request,
        };

        let rows = match view {
            Some(view) => view(&context, key, options)?,
            None => {
                let docs = context.table.order_by(&self.options().order_by)?;
                ViewRows::Many(docs.into_iter().map(ViewRow::Raw).collect())
            }
        };

        marshal(rows)
    }

    /// Default listing ordered by the configured sort field.
    pub fn list(&self, scope: Option<&mut RequestScope>) -> AdapterResult<Vec<M>> {
        Ok(self.view(scope, None, None, &QueryOptions::new())?.into_vec())
    }
}

fn marshal<M: Model>(rows: ViewRows<M>) -> AdapterResult<ViewOutput<M>> {
    match rows {
        ViewRows::None => Ok(ViewOutput::None),
        ViewRows::One(row) => Ok(ViewOutput::One(marshal_row(row)?)),
        ViewRows::Many(rows) => Ok(ViewOutput::Many(
            rows.into_iter()
                .map(marshal_row)
                .collect::<AdapterResult<Vec<M>>>()?,
        )),
    }
}

fn marshal_row<M: Model>(row: ViewRow<M>) -> AdapterResult<M> {
    match row {
        ViewRow::Raw(doc) => Ok(M::from_document(&doc)?),
        ViewRow::Instance(model) => Ok(model),
    }
}
