//! Shared test fixtures: the `items` model and its views.

#![allow(dead_code)]

use docbind_core::{
    model::document, AdapterOptions, ConnectOptions, Connection, DbError, DbResult, Document,
    DocumentError, IndexSpec, MemoryDriver, Model, ModelAdapter, ModelDescriptor, PropertyKind,
    PropertySpec, StoreDriver, ViewRow, ViewRows,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::cell::Cell;
use std::rc::Rc;

/// Test entity: `user` carries a simple index, `key` a composite
/// function-derived index over `[user, key]`, `tags` a multi index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: Option<String>,
    pub user: Option<i64>,
    pub key: Option<String>,
    pub tags: Option<Vec<String>>,
    /// Private field: excluded from serialization unless asked for.
    pub token: Option<String>,
}

impl Item {
    pub fn new(user: Option<i64>, key: Option<&str>, tags: Option<Vec<&str>>) -> Self {
        Self {
            id: None,
            user,
            key: key.map(str::to_string),
            tags: tags.map(|tags| tags.into_iter().map(str::to_string).collect()),
            token: None,
        }
    }
}

fn user_key_pair(doc: &Document) -> Value {
    json!([
        doc.get("user").cloned().unwrap_or(Value::Null),
        doc.get("key").cloned().unwrap_or(Value::Null),
    ])
}

const ITEM_DESCRIPTOR: ModelDescriptor = ModelDescriptor {
    type_name: "items",
    properties: &[
        PropertySpec {
            name: "user",
            kind: PropertyKind::Number,
            index: IndexSpec::Simple,
        },
        PropertySpec {
            name: "key",
            kind: PropertyKind::String,
            index: IndexSpec::Computed(user_key_pair),
        },
        PropertySpec {
            name: "tags",
            kind: PropertyKind::Array,
            index: IndexSpec::Simple,
        },
    ],
};

impl Model for Item {
    fn descriptor() -> &'static ModelDescriptor {
        &ITEM_DESCRIPTOR
    }

    fn from_document(doc: &Document) -> Result<Self, DocumentError> {
        document::from_document(doc)
    }

    fn to_document(&self, include_private: bool) -> Document {
        let mut doc = document::to_document(self).unwrap_or_default();
        if !include_private {
            doc.remove("token");
        }
        doc
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn assign_id(&mut self, id: String) {
        self.id = Some(id);
    }
}

/// Registers the three views the integration scenarios share.
pub fn define_views(adapter: &mut ModelAdapter<Item>) {
    adapter.define_view("byUser", |context, key, _options| {
        let rows = context
            .table
            .get_all("user", key.unwrap_or(&Value::Null))?;
        Ok(ViewRows::Many(rows.into_iter().map(ViewRow::Raw).collect()))
    });

    adapter.define_view("byKey", |context, key, _options| {
        let user = context
            .request
            .and_then(|request| request.get("user"))
            .cloned()
            .unwrap_or(Value::Null);
        let pair = json!([user, key.cloned().unwrap_or(Value::Null)]);
        let rows = context.table.get_all("key", &pair)?;
        Ok(ViewRows::Many(rows.into_iter().map(ViewRow::Raw).collect()))
    });

    adapter.define_view("byTag", |context, key, _options| {
        let rows = context
            .table
            .get_all("tags", key.unwrap_or(&Value::Null))?;
        Ok(ViewRows::Many(rows.into_iter().map(ViewRow::Raw).collect()))
    });
}

/// Initialized adapter over a shared in-memory store. The returned driver
/// clone observes the same state, for raw verification reads.
pub fn item_adapter() -> (ModelAdapter<Item>, MemoryDriver) {
    let driver = MemoryDriver::new();
    let adapter = ModelAdapter::setup(
        Rc::new(driver.clone()),
        AdapterOptions::default(),
        define_views,
    )
    .expect("adapter setup should succeed");
    (adapter, driver)
}

/// Opens a raw verification connection against the shared store.
pub fn raw_connection(driver: &MemoryDriver) -> Connection {
    driver
        .connect(&ConnectOptions::default())
        .expect("raw connection should open")
}

/// Driver that counts how many connections it has opened.
#[derive(Clone)]
pub struct CountingDriver {
    inner: MemoryDriver,
    connects: Rc<Cell<usize>>,
}

impl CountingDriver {
    pub fn new(inner: MemoryDriver) -> Self {
        Self {
            inner,
            connects: Rc::new(Cell::new(0)),
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.get()
    }
}

impl StoreDriver for CountingDriver {
    fn connect(&self, options: &ConnectOptions) -> DbResult<Connection> {
        self.connects.set(self.connects.get() + 1);
        self.inner.connect(options)
    }
}

/// Driver that refuses every connection attempt. Operations that must not
/// touch the store are run against it: any round trip fails the test.
pub struct RefusingDriver;

impl StoreDriver for RefusingDriver {
    fn connect(&self, _options: &ConnectOptions) -> DbResult<Connection> {
        Err(DbError::Connect("unexpected store call".to_string()))
    }
}
