//! Table and secondary-index provisioning.
//!
//! # Responsibility
//! - Ensure the model's table exists before first use.
//! - Create every index declared by the model's properties.
//!
//! # Invariants
//! - Table creation strictly precedes index creation.
//! - The number of index creations is known up front from the declared
//!   property list; completion is reported only after all of them ran.
//! - Index-creation failures are aggregated, never swallowed.

use crate::db::driver::{Connection, IndexDefinition, IndexKind};
use crate::db::scope::RequestScope;
use crate::model::descriptor::{IndexSpec, Model, PropertyKind, PropertySpec};
use crate::repo::adapter::{AdapterError, AdapterResult, IndexFailure, ModelAdapter};
use log::{debug, info, warn};
use std::collections::HashSet;

impl<M: Model> ModelAdapter<M> {
    /// Provisions the model's table and declared secondary indexes.
    ///
    /// Idempotent: existing tables and indexes are left untouched. A
    /// table-list or table-create failure aborts before any index work.
    pub fn initialize(&self, scope: Option<&mut RequestScope>) -> AdapterResult<()> {
        let table = self.table_name();
        let connection = self.connect(scope)?;

        let tables = connection.table_list()?;
        if tables.iter().any(|name| name == table) {
            debug!("event=table_create module=repo status=skip table={table} reason=exists");
        } else {
            connection.table_create(table)?;
            info!("event=table_create module=repo status=ok table={table}");
        }

        self.create_indexes(&connection)
    }

    fn create_indexes(&self, connection: &Connection) -> AdapterResult<()> {
        let table = self.table_name();
        let existing: HashSet<String> = connection.index_list(table)?.into_iter().collect();

        let mut failures = Vec::new();
        let mut created = 0usize;

        // Every declared index is attempted; failures do not stop siblings.
        for property in M::descriptor().properties {
            let Some(definition) = index_definition(property) else {
                continue;
            };
            if existing.contains(&definition.name) {
                debug!(
                    "event=index_create module=repo status=skip table={table} index={} reason=exists",
                    definition.name
                );
                continue;
            }

            let name = definition.name.clone();
            match connection.index_create(table, definition) {
                Ok(()) => created += 1,
                Err(error) => {
                    warn!(
                        "event=index_create module=repo status=error table={table} index={name} error={error}"
                    );
                    failures.push(IndexFailure { index: name, error });
                }
            }
        }

        info!(
            "event=initialize module=repo status={} table={table} indexes_created={created} indexes_failed={}",
            if failures.is_empty() { "ok" } else { "error" },
            failures.len()
        );

        if failures.is_empty() {
            Ok(())
        } else {
            Err(AdapterError::IndexCreation(failures))
        }
    }
}

/// Maps a property's index specification to a concrete index definition.
///
/// A simple index on an array-typed property gets multi-value semantics.
pub fn index_definition(property: &PropertySpec) -> Option<IndexDefinition> {
    let kind = match property.index {
        IndexSpec::None => return None,
        IndexSpec::Computed(derive) => IndexKind::Computed(derive),
        IndexSpec::Simple if property.kind == PropertyKind::Array => IndexKind::Multi {
            field: property.name.to_string(),
        },
        IndexSpec::Simple => IndexKind::Simple {
            field: property.name.to_string(),
        },
    };

    Some(IndexDefinition {
        name: property.name.to_string(),
        kind,
    })
}
