//! JSON extractor with `validator` rules.

use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use super::Json;
use crate::handler::{Error, ErrorKind};

/// Tracing target for request validation.
const TRACING_TARGET: &str = "outlet_server::extract::validate";

/// JSON extractor that validates the payload after deserializing it.
#[must_use]
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateJson<T>(pub T);

impl<T> ValidateJson<T> {
    /// Returns the inner validated value.
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T, S> FromRequest<S> for ValidateJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = <Json<T> as FromRequest<S>>::from_request(req, state).await?;
        data.validate()?;
        Ok(Self(data))
    }
}

impl From<ValidationErrors> for Error<'static> {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages = Vec::new();
        collect_messages("", &errors, &mut messages);

        tracing::debug!(
            target: TRACING_TARGET,
            errors = ?messages,
            "Request validation failed"
        );

        let message = match messages.as_slice() {
            [] => "Validation failed".to_string(),
            _ => messages.join(". "),
        };

        ErrorKind::BadRequest
            .with_message(message)
            .with_resource("request")
    }
}

/// Flattens nested validation errors into `path: message` strings.
fn collect_messages(prefix: &str, errors: &ValidationErrors, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let field: &str = &**field;
        let path = match (prefix.is_empty(), field) {
            (true, "__all__") => String::new(),
            (true, field) => field.to_string(),
            (false, "__all__") => prefix.to_string(),
            (false, field) => format!("{prefix}.{field}"),
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let detail = error
                        .message
                        .as_deref()
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("failed `{}` check", error.code));
                    out.push(if path.is_empty() {
                        detail
                    } else {
                        format!("{path}: {detail}")
                    });
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_messages(&path, nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_messages(&format!("{path}[{index}]"), nested, out);
                }
            }
        }
    }
}
