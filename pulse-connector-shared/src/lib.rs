//! # Pulse Connector Shared
//!
//! Shared types and data structures for the pulse connector system.

pub mod document;

pub use document::PulseDocument;
