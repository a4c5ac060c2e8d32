//! Error types for leabra-neuromod

use thiserror::Error;

/// Simulation error type
#[derive(Debug, Error)]
pub enum LeabraError {
    /// A specialized layer references a layer name that does not exist
    #[error("Layer {referenced_by}: referenced layer not found: {layer}")]
    MissingLayer {
        layer: String,
        referenced_by: String,
    },

    /// Introspection lookup for a variable this layer or pathway does not carry
    #[error("Unknown variable {name} on {scope}")]
    UnknownVariable { name: String, scope: String },

    /// NaN or Inf escaped into simulation state
    #[error("Numeric degeneracy in layer {layer}: {what}")]
    NumericDegeneracy { layer: String, what: String },

    /// Shape mismatch between layers or external input
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Network or pathway construction error
    #[error("Build error: {0}")]
    Build(String),

    /// Index out of range in an accessor
    #[error("Index {index} out of range for {scope} (len {len})")]
    IndexOutOfRange {
        index: usize,
        len: usize,
        scope: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parameter bundle decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LeabraError>;
