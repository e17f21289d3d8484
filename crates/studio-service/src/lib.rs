//! Business-rule orchestration for the design-document studio backend
//! (spec.md §4, C6-C8): the tree service, document service, context-assembly
//! service, dictionary service, and project service, each composed over the
//! `studio-store` traits and testable against in-memory fakes without a live
//! database.

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Tree service: type-constrained node creation, move validation, cascading
/// delete, and in-memory tree assembly (spec.md §4.2, C6).
pub mod tree;
/// Document service: existence-checked content access and idempotent
/// document initialisation (spec.md §4.3, C7).
pub mod document;
/// Context-assembly service: ancestors/descendants slice enriched with
/// rendered document text (spec.md §4.4, C8).
pub mod context_assembly;
/// Dictionary service: term/definition validation over the dictionary store
/// (spec.md §3, supplemented per `DESIGN.md`).
pub mod dictionary;
/// Project service: CRUD plus cascading delete (spec.md §4.5, C2).
pub mod project;

#[cfg(test)]
mod test_support;

pub use context_assembly::{ApplicationDetail, ContextAssemblyService, Entry};
pub use dictionary::DictionaryService;
pub use document::DocumentService;
pub use project::ProjectService;
pub use tree::{TreeNode, TreeService};
