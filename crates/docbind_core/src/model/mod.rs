//! Model collaborator contract consumed by the persistence adapter.
//!
//! # Responsibility
//! - Define the descriptor metadata a model exposes (type name, ordered
//!   properties, index specifications).
//! - Define the document representation exchanged with the store.
//!
//! # Invariants
//! - A model's type name doubles as its table name and never changes at
//!   runtime.
//! - Property order in the descriptor is declaration order; index
//!   provisioning iterates it deterministically.

pub mod descriptor;
pub mod document;
