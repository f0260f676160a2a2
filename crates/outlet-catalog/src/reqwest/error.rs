//! Error types for the reqwest-based catalog client.

use thiserror::Error;

/// Result type alias for reqwest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for reqwest operations.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// The catalog URL could not be built.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl From<Error> for crate::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Reqwest(e) => {
                if e.is_timeout() {
                    crate::Error::timeout()
                        .with_message(e.to_string())
                        .with_source(e)
                } else if e.is_connect() {
                    crate::Error::network_error()
                        .with_message("Connection to catalog service failed")
                        .with_source(e)
                } else if e.is_decode() {
                    crate::Error::serialization()
                        .with_message(e.to_string())
                        .with_source(e)
                } else {
                    crate::Error::network_error()
                        .with_message(e.to_string())
                        .with_source(e)
                }
            }
            Error::Url(e) => crate::Error::configuration()
                .with_message(e.to_string())
                .with_source(e),
        }
    }
}
