//! Core entities for the design-document studio: projects, the
//! application/page/function node tree, and the documents attached to
//! function nodes.
//!
//! This crate is pure data plus the invariants that follow directly from the
//! shape of the data (path computation, the node-type parent grammar, field
//! length limits). It has no knowledge of storage or transport — those live
//! in `studio-store`, `studio-service`, and `studio-api`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Field length limits and other fixed constants from the data model.
pub mod limits;
/// Caller identity attached to entities as creator/editor.
pub mod identity;
/// The project entity.
pub mod project;
/// The typed, ordered, materialised-path node tree.
pub mod node;
/// Per-function-node document metadata and content.
pub mod document;
/// Project-scoped dictionary entries.
pub mod dictionary;

pub use identity::Identity;
pub use node::{NodeType, ProjectNode};
pub use project::Project;
pub use document::{DocumentContent, FunctionDocument};
pub use dictionary::DictionaryEntry;
