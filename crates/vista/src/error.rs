//! Error types for the Vista library.

use std::path::PathBuf;
use thiserror::Error;

use crate::instance::InstanceId;

/// Main error type for Vista operations.
///
/// Soft conditions (incompatible copy, nothing to aggregate, no neighbouring
/// target) are reported through outcome enums instead of this type.
#[derive(Debug, Error)]
pub enum VistaError {
    /// Error reading or writing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Layout data could not be read in any accepted shape.
    #[error("Invalid layout data: {0}")]
    LayoutData(String),

    /// A component type identifier that is not in the catalog.
    #[error("Unknown component type '{0}'")]
    UnknownComponent(String),

    /// The session does not know this layout instance.
    #[error("Unknown layout instance {0}")]
    UnknownInstance(InstanceId),

    /// The layout does not contain this card.
    #[error("Unknown card '{0}'")]
    UnknownCard(String),

    /// A custom width outside the accepted percentage range.
    #[error("Invalid width {width} for card '{card_id}' (expected 0 < width <= 100)")]
    InvalidWidth { card_id: String, width: f64 },

    /// A temporary instance could not be turned into a persisted one.
    #[error("Failed to create layout instance for temporary id {temporary_id}: {message}")]
    InstanceCreation {
        temporary_id: InstanceId,
        message: String,
    },

    /// Saving one instance's component data failed.
    #[error("Failed to save data for layout instance {instance}: {message}")]
    Persistence { instance: InstanceId, message: String },

    /// An external service reported a failure.
    #[error("Service error: {0}")]
    Service(String),

    /// An operation that needs a persisted exam was called without one.
    #[error("No exam id available for this session")]
    MissingExam,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for Vista operations.
pub type Result<T> = std::result::Result<T, VistaError>;
