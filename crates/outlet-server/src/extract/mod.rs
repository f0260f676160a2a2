//! Request extractors with JSON error responses.
//!
//! - [`Json`] maps axum's JSON rejections to [`Error`](crate::handler::Error)s
//! - [`ValidateJson`] additionally runs `validator` rules on the payload

mod json;
mod validated_json;

pub use json::Json;
pub use validated_json::ValidateJson;
