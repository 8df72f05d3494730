//! # Pulse Connector Repository
//!
//! This crate provides the trait and implementation for interacting with the
//! document store. It includes definitions for errors, the store interface,
//! and a concrete implementation for OpenSearch.

pub mod errors;
pub mod interfaces;
pub mod opensearch;

pub use errors::StoreError;
pub use interfaces::{DocumentStore, UpsertOutcome};
pub use opensearch::OpenSearchClient;
