//! Relational persistence for the design-document studio backend
//! (spec.md §4: C2 project store, C3 node store, C4 document-meta store, C5
//! document-content store, plus the dictionary store supplementing §3/§4.5).
//!
//! Each sub-module defines a trait describing the store's contract and a
//! `Pg*` struct implementing it against a [`sqlx::PgPool`]. Callers in
//! `studio-service` depend on the traits (usually behind `Arc<dyn Trait>`),
//! which keeps the service layer testable against in-memory fakes without a
//! live database.

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Project CRUD and creator-scoped listing (spec.md §4.5, C2).
pub mod project;
/// Typed-tree persistence: create/read/move/delete, path maintenance,
/// sibling ordering (spec.md §4.1, C3).
pub mod node;
/// Per-function-node document metadata, 1:1 with a function node
/// (spec.md §3 `FunctionDocument`, C4).
pub mod document_meta;
/// Single-JSON-object document payload, with atomic RFC 6902 patch
/// application (spec.md §4.3, C5).
pub mod document_content;
/// Project-scoped dictionary entries (spec.md §3 `DictionaryEntry`).
pub mod dictionary;

mod pg_error;

pub use dictionary::{DictionaryStore, PgDictionaryStore};
pub use document_content::{DocumentContentStore, PgDocumentContentStore};
pub use document_meta::{DocumentMetaStore, PgDocumentMetaStore};
pub use node::{NewNode, NodeStore, PgNodeStore, UpdateNode};
pub use project::{NewProject, PgProjectStore, ProjectStore, UpdateProject};
