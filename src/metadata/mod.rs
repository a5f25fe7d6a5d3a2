//! Metadata Document Module
//!
//! Persistence layer for table metadata documents. The store abstracts the
//! physical file layout behind logical (database, table) addressing; the
//! document type keeps hand-authored content intact while exposing the one
//! section the reconciler owns.

pub mod document;
pub mod store;

pub use document::{TableDocument, DEFAULT_SCHEMA, EVENT_TRIGGERS_KEY};
pub use store::MetadataStore;
