//! Processor module for the pulse connector pipeline.
//!
//! Transforms raw API records into normalized documents.

mod pulse_processor;

pub use pulse_processor::{ProcessedPage, PulseProcessor};
