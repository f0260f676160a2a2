//! Tool execution errors.

/// Error returned by a tool.
///
/// The registry turns these into `{"error": "..."}` payloads for the model.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// The requested record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Arguments passed schema validation but are semantically invalid.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The catalog could not be reached or answered with an error.
    #[error("catalog unavailable: {0}")]
    Catalog(#[from] outlet_catalog::Error),

    /// Retrieval failed.
    #[error("{0}")]
    Internal(#[from] crate::Error),
}
