//! # Pulse Connector
//!
//! Main library for the pulse connector.
//!
//! This crate provides the entry point and configuration for running
//! the connector pipeline.

pub mod config;

pub use config::{Dependencies, Settings, SourceMode};

use thiserror::Error;

/// Errors that can occur during connector initialization or execution.
#[derive(Error, Debug)]
pub enum ConnectorError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    PipelineError(#[from] pulse_connector_pipeline::PipelineError),

    /// Document store error.
    #[error("Store error: {0}")]
    StoreError(#[from] pulse_connector_repository::StoreError),
}

impl ConnectorError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
