//! Error types for the Circuit Quest engine.
//!
//! This module provides a unified error type [`CircuitError`] for the
//! structural failures that can occur while reading and loading level
//! definitions. Gameplay preconditions (unknown ids, self-connections) are
//! reported as `false` by the simulator, and simulation problems are reported
//! inside a [`SimulationResult`](crate::solver::SimulationResult), so neither
//! appears here.

use thiserror::Error;

/// Result type alias using [`CircuitError`].
pub type Result<T> = std::result::Result<T, CircuitError>;

/// Unified error type for all Circuit Quest operations.
#[derive(Error, Debug)]
pub enum CircuitError {
    // ============ Level Loading Errors ============
    /// Level JSON could not be decoded
    #[error("Invalid level definition: {source}")]
    LevelFormat {
        #[source]
        source: serde_json::Error,
    },

    /// Two components in one level share an id
    #[error("Duplicate component id '{id}' in level '{level}'")]
    DuplicateComponent { level: String, id: String },

    /// A component definition is unusable
    #[error("Invalid component '{id}': {message}")]
    InvalidComponent { id: String, message: String },

    /// A reference to a component that is not part of the level
    #[error("Unknown component '{id}' referenced by {context}")]
    UnknownComponent { id: String, context: String },

    // ============ Engine Errors ============
    /// The connection graph references a component that is not registered
    #[error("Connection graph references unregistered component '{id}'")]
    DanglingConnection { id: String },

    /// A component value is NaN or infinite
    #[error("Component '{id}' has a non-finite {field}")]
    NonFiniteValue { id: String, field: &'static str },

    // ============ I/O Errors ============
    /// Error reading a level file
    #[error("Failed to read level file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Error writing a report
    #[error("Failed to write report: {message}")]
    ReportWriteError { message: String },

    // ============ WASM Errors ============
    /// WASM-specific error
    #[cfg(feature = "wasm")]
    #[error("WASM error: {message}")]
    WasmError { message: String },
}

impl CircuitError {
    /// Create an invalid component error
    pub fn invalid_component(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidComponent {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Create an unknown component error
    pub fn unknown_component(id: impl Into<String>, context: impl Into<String>) -> Self {
        Self::UnknownComponent {
            id: id.into(),
            context: context.into(),
        }
    }

    /// Create a duplicate component error
    pub fn duplicate_component(level: impl Into<String>, id: impl Into<String>) -> Self {
        Self::DuplicateComponent {
            level: level.into(),
            id: id.into(),
        }
    }
}

impl From<serde_json::Error> for CircuitError {
    fn from(source: serde_json::Error) -> Self {
        Self::LevelFormat { source }
    }
}
