//! Server startup and runtime errors.

use std::io;

/// Result type for server operations.
pub type Result<T, E = ServerError> = std::result::Result<T, E>;

/// Errors that stop the HTTP server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The server configuration failed validation.
    #[error("invalid server configuration: {0}")]
    InvalidConfig(String),

    /// The listener could not be bound.
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    /// The server stopped with an I/O error.
    #[error("server runtime error: {0}")]
    Runtime(#[from] io::Error),
}
