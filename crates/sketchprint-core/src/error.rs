//! Error types for the document model and drawing protocol.

use thiserror::Error;

/// Errors raised by document and registry operations.
///
/// A failed operation never leaves the document partially mutated.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("{0}")]
    Validation(String),
    #[error("Unknown shape type: {0}")]
    UnknownShapeType(String),
    #[error("Element index out of bounds: {index} (document has {len} elements)")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl DocumentError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        DocumentError::Validation(message.into())
    }
}

/// Errors raised while a single shape draws itself.
///
/// These are element-level: the render pipeline logs them and moves on.
#[derive(Debug, Error)]
pub enum DrawError {
    #[error("{0} has non-finite or out-of-range geometry")]
    NonFiniteGeometry(&'static str),
}

/// Errors reported by a drawing context for resources it cannot provide.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Image unavailable: {0}")]
    Unavailable(String),
    #[error("Image could not be decoded: {0}")]
    Decode(String),
}

/// Result type for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;
