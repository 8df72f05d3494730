//! Document store error types.
//!
//! This module defines the error types that can occur during document store
//! operations.

use thiserror::Error;

/// Errors that can occur during document store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to establish connection to the document store.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Failed to upsert a document.
    #[error("Upsert error: {0}")]
    UpsertError(String),

    /// Failed to insert a document.
    #[error("Insert error: {0}")]
    InsertError(String),

    /// Failed to create the document index.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// Failed to serialize a document for the store.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl StoreError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create an upsert error.
    pub fn upsert(msg: impl Into<String>) -> Self {
        Self::UpsertError(msg.into())
    }

    /// Create an insert error.
    pub fn insert(msg: impl Into<String>) -> Self {
        Self::InsertError(msg.into())
    }

    /// Create an index creation error.
    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }
}
