//! Abstract interfaces for the document store.

mod document_store;

pub use document_store::{DocumentStore, UpsertOutcome};
