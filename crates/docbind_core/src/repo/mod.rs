//! Persistence adapter binding models to a document store.
//!
//! # Responsibility
//! - Expose CRUD and named-view execution over the store driver seam.
//! - Provision tables and secondary indexes from model descriptors.
//!
//! # Invariants
//! - Every operation resolves its connection through the request scope
//!   before touching the store.
//! - Absence of a document is a successful `None`, never an error.

pub mod adapter;
pub mod bootstrap;
pub mod view;
