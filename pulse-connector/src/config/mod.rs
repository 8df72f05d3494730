//! Configuration and dependency wiring for the pulse connector.

mod dependencies;
mod settings;

pub use dependencies::Dependencies;
pub use settings::{Settings, SourceMode};
