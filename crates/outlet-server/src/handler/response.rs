//! Response bodies.

use std::borrow::Cow;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use strum::{AsRefStr, Display};

/// JSON body of an error response.
#[must_use = "error responses do nothing unless serialized"]
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse<'a> {
    /// Stable error identifier
    pub name: Cow<'a, str>,
    /// Message safe to show to the client
    pub message: Cow<'a, str>,
    /// The resource the error relates to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Cow<'a, str>>,
    /// Debugging context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Cow<'a, str>>,
    /// HTTP status code
    #[serde(skip)]
    pub status: StatusCode,
}

impl<'a> ErrorResponse<'a> {
    pub const BAD_REQUEST: Self = Self::new(
        "bad_request",
        "The request could not be processed due to invalid data",
        StatusCode::BAD_REQUEST,
    );
    pub const GATEWAY_TIMEOUT: Self = Self::new(
        "gateway_timeout",
        "The request took too long to process",
        StatusCode::GATEWAY_TIMEOUT,
    );
    pub const INTERNAL_SERVER_ERROR: Self = Self::new(
        "internal_server_error",
        "An internal server error occurred. Please try again later",
        StatusCode::INTERNAL_SERVER_ERROR,
    );
    pub const NOT_FOUND: Self = Self::new(
        "not_found",
        "The requested resource was not found",
        StatusCode::NOT_FOUND,
    );
    pub const PAYLOAD_TOO_LARGE: Self = Self::new(
        "payload_too_large",
        "The request body is too large",
        StatusCode::PAYLOAD_TOO_LARGE,
    );
    pub const SERVICE_UNAVAILABLE: Self = Self::new(
        "service_unavailable",
        "The service is temporarily unavailable",
        StatusCode::SERVICE_UNAVAILABLE,
    );
    pub const UNSUPPORTED_MEDIA_TYPE: Self = Self::new(
        "unsupported_media_type",
        "Expected a request with Content-Type: application/json",
        StatusCode::UNSUPPORTED_MEDIA_TYPE,
    );

    /// Creates a new error response.
    #[inline]
    pub const fn new(name: &'a str, message: &'a str, status: StatusCode) -> Self {
        Self {
            name: Cow::Borrowed(name),
            message: Cow::Borrowed(message),
            resource: None,
            context: None,
            status,
        }
    }

    /// Replaces the message.
    pub fn with_message(mut self, message: impl Into<Cow<'a, str>>) -> Self {
        self.message = message.into();
        self
    }

    /// Sets the resource.
    pub fn with_resource(mut self, resource: impl Into<Cow<'a, str>>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Attaches context, appending to any existing context.
    pub fn with_context(mut self, context: impl Into<Cow<'a, str>>) -> Self {
        let context = context.into();
        self.context = Some(match self.context {
            Some(existing) => Cow::Owned(format!("{existing}; {context}")),
            None => context,
        });
        self
    }
}

impl Default for ErrorResponse<'_> {
    #[inline]
    fn default() -> Self {
        Self::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ErrorResponse<'_> {
    #[inline]
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Overall service status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HealthStatus {
    /// The outlet index is built.
    Ok,
    /// The index is not built yet or its last build failed; semantic search
    /// answers with no results.
    Degraded,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub index_ready: bool,
    pub documents: usize,
    pub model: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_json() {
        let response = ErrorResponse::NOT_FOUND.with_resource("route");
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["name"], "not_found");
        assert_eq!(value["resource"], "route");
        assert!(value.get("context").is_none());
        assert!(value.get("status").is_none());
    }

    #[test]
    fn context_is_appended() {
        let response = ErrorResponse::BAD_REQUEST
            .with_context("first")
            .with_context("second");
        assert_eq!(response.context.as_deref(), Some("first; second"));
    }

    #[test]
    fn health_response_is_camel_case() {
        let value = serde_json::to_value(HealthResponse {
            status: HealthStatus::Degraded,
            index_ready: false,
            documents: 0,
            model: "gpt-4o".to_string(),
        })
        .unwrap();

        assert_eq!(value["status"], "degraded");
        assert_eq!(value["indexReady"], false);
    }
}
