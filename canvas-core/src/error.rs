//! Error types for canvas operations.

use thiserror::Error;

/// Result type for canvas operations.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Errors that can occur in canvas operations.
///
/// Only programmer misuse of the drawing API surfaces here. Routine
/// absences (no canvas attached yet, element off-screen, unknown id on
/// removal) are reported through `bool`/`Option` returns instead.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// A rectangle, radius or view had a negative or non-finite extent.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A path primitive was issued before `begin_path`.
    #[error("Path operation '{0}' issued with no path begun")]
    NoActivePath(&'static str),

    /// Element not found in the scene graph.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// An element with the same id already lives in the target group.
    #[error("Duplicate element id: {0}")]
    DuplicateElement(String),

    /// Invalid element operation.
    #[error("Invalid operation on element: {0}")]
    InvalidOperation(String),

    /// Canvas configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Descriptor or configuration (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
