//! In-process reference driver.
//!
//! # Responsibility
//! - Provide an embedded document store with real simple/multi/computed
//!   index semantics, shared by every connection from one driver.
//! - Back the integration tests without an external server.
//!
//! # Invariants
//! - Rows are kept in primary-key order; `get_all` results inherit it.
//! - A closed connection fails every further call with `ConnectionClosed`.
//! - Generated primary keys are UUID v4 strings.

use crate::db::driver::{
    ConnectOptions, Connection, IndexDefinition, IndexKind, ReadMode, StoreConnection, StoreDriver,
};
use crate::db::{DbError, DbResult};
use crate::model::document::Document;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::rc::Rc;
use uuid::Uuid;

#[derive(Default)]
struct TableState {
    rows: BTreeMap<String, Document>,
    indexes: BTreeMap<String, IndexDefinition>,
}

#[derive(Default)]
struct StoreState {
    tables: BTreeMap<String, TableState>,
}

/// Embedded document store. Cloning shares the underlying state, the way
/// several connections share one server.
#[derive(Clone, Default)]
pub struct MemoryDriver {
    state: Rc<RefCell<StoreState>>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoreDriver for MemoryDriver {
    fn connect(&self, _options: &ConnectOptions) -> DbResult<Connection> {
        Ok(Rc::new(MemoryConnection {
            state: Rc::clone(&self.state),
            closed: Cell::new(false),
        }))
    }
}

/// One session against a [`MemoryDriver`].
pub struct MemoryConnection {
    state: Rc<RefCell<StoreState>>,
    closed: Cell<bool>,
}

impl MemoryConnection {
    fn ensure_open(&self) -> DbResult<()> {
        if self.closed.get() {
            return Err(DbError::ConnectionClosed);
        }
        Ok(())
    }

    fn with_table<T>(&self, table: &str, f: impl FnOnce(&TableState) -> DbResult<T>) -> DbResult<T> {
        self.ensure_open()?;
        let state = self.state.borrow();
        let table_state = state
            .tables
            .get(table)
            .ok_or_else(|| DbError::UnknownTable(table.to_string()))?;
        f(table_state)
    }

    fn with_table_mut<T>(
        &self,
        table: &str,
        f: impl FnOnce(&mut TableState) -> DbResult<T>,
    ) -> DbResult<T> {
        self.ensure_open()?;
        let mut state = self.state.borrow_mut();
        let table_state = state
            .tables
            .get_mut(table)
            .ok_or_else(|| DbError::UnknownTable(table.to_string()))?;
        f(table_state)
    }
}

impl StoreConnection for MemoryConnection {
    fn table_list(&self) -> DbResult<Vec<String>> {
        self.ensure_open()?;
        Ok(self.state.borrow().tables.keys().cloned().collect())
    }

    fn table_create(&self, table: &str) -> DbResult<()> {
        self.ensure_open()?;
        let mut state = self.state.borrow_mut();
        if state.tables.contains_key(table) {
            return Err(DbError::TableExists(table.to_string()));
        }
        state.tables.insert(table.to_string(), TableState::default());
        Ok(())
    }

    fn index_create(&self, table: &str, index: IndexDefinition) -> DbResult<()> {
        self.with_table_mut(table, |table_state| {
            if table_state.indexes.contains_key(&index.name) {
                return Err(DbError::Driver(format!(
                    "index `{}` already exists",
                    index.name
                )));
            }
            table_state.indexes.insert(index.name.clone(), index);
            Ok(())
        })
    }

    fn index_list(&self, table: &str) -> DbResult<Vec<String>> {
        self.with_table(table, |table_state| {
            Ok(table_state.indexes.keys().cloned().collect())
        })
    }

    fn get(&self, table: &str, id: &str) -> DbResult<Option<Document>> {
        self.with_table(table, |table_state| Ok(table_state.rows.get(id).cloned()))
    }

    fn insert(&self, table: &str, mut doc: Document) -> DbResult<String> {
        let table_name = table.to_string();
        self.with_table_mut(table, |table_state| {
            let id = match doc.get("id") {
                None | Some(Value::Null) => Uuid::new_v4().to_string(),
                Some(Value::String(id)) => id.clone(),
                Some(other) => {
                    return Err(DbError::InvalidKey(format!(
                        "expected a string id, got {other}"
                    )));
                }
            };
            if table_state.rows.contains_key(&id) {
                return Err(DbError::DuplicateKey {
                    table: table_name,
                    key: id,
                });
            }
            doc.insert("id".to_string(), Value::String(id.clone()));
            table_state.rows.insert(id.clone(), doc);
            Ok(id)
        })
    }

    fn replace(&self, table: &str, id: &str, mut doc: Document) -> DbResult<()> {
        self.with_table_mut(table, |table_state| {
            doc.insert("id".to_string(), Value::String(id.to_string()));
            table_state.rows.insert(id.to_string(), doc);
            Ok(())
        })
    }

    fn delete(&self, table: &str, id: &str) -> DbResult<()> {
        // Deleting an absent row is not an error.
        self.with_table_mut(table, |table_state| {
            table_state.rows.remove(id);
            Ok(())
        })
    }

    fn get_all(
        &self,
        table: &str,
        index: &str,
        key: &Value,
        _read: ReadMode,
    ) -> DbResult<Vec<Document>> {
        let table_name = table.to_string();
        self.with_table(table, |table_state| {
            let definition =
                table_state
                    .indexes
                    .get(index)
                    .ok_or_else(|| DbError::UnknownIndex {
                        table: table_name,
                        index: index.to_string(),
                    })?;
            Ok(table_state
                .rows
                .values()
                .filter(|doc| index_matches(definition, doc, key))
                .cloned()
                .collect())
        })
    }

    fn scan(&self, table: &str, order_by: &str, _read: ReadMode) -> DbResult<Vec<Document>> {
        self.with_table(table, |table_state| {
            let mut rows: Vec<Document> = table_state.rows.values().cloned().collect();
            rows.sort_by(|a, b| {
                value_order(
                    a.get(order_by).unwrap_or(&Value::Null),
                    b.get(order_by).unwrap_or(&Value::Null),
                )
            });
            Ok(rows)
        })
    }

    fn close(&self) -> DbResult<()> {
        if self.closed.get() {
            return Err(DbError::ConnectionClosed);
        }
        self.closed.set(true);
        Ok(())
    }
}

fn index_matches(definition: &IndexDefinition, doc: &Document, key: &Value) -> bool {
    match &definition.kind {
        IndexKind::Simple { field } => doc.get(field) == Some(key),
        IndexKind::Multi { field } => doc
            .get(field)
            .and_then(Value::as_array)
            .is_some_and(|values| values.contains(key)),
        IndexKind::Computed(derive) => derive(doc) == *key,
    }
}

/// Total order over JSON values: by type rank, then within the type.
fn value_order(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ if rank(a) != rank(b) => rank(a).cmp(&rank(b)),
        _ => a.to_string().cmp(&b.to_string()),
    }
}
