use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use laborlink_core::validate::{ValidationError, ValidationErrors};

#[derive(Debug, Serialize)]
struct ProblemDetails {
    #[serde(rename = "type")]
    problem_type: &'static str,
    title: &'static str,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    invalid_numbers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<ValidationError>>,
}

/// RFC 7807 problem response used for every error leaving the API.
pub struct ProblemResponse {
    status: StatusCode,
    body: ProblemDetails,
}

impl ProblemResponse {
    pub fn new<S: Into<String>>(status: StatusCode, problem_type: &'static str, detail: S) -> Self {
        Self {
            status,
            body: ProblemDetails {
                problem_type,
                title: status.canonical_reason().unwrap_or("error"),
                detail: detail.into(),
                invalid_numbers: None,
                errors: None,
            },
        }
    }

    /// Attaches the list of offending phone numbers carried by
    /// assignment failures.
    pub fn with_invalid_numbers(mut self, numbers: Vec<String>) -> Self {
        self.body.invalid_numbers = Some(numbers);
        self
    }

    /// Builds the 422 response for a schema-level rejection, carrying
    /// field-level detail.
    pub fn validation(errors: ValidationErrors) -> Self {
        let mut response = Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "validation_failed",
            errors.to_string(),
        );
        response.body.errors = Some(errors.0);
        response
    }

    /// Builds the 422 response for a request body that failed JSON
    /// extraction.
    pub fn bad_json(rejection: JsonRejection) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid_body",
            rejection.body_text(),
        )
    }

    /// Logs an unexpected failure and returns an opaque 500 without
    /// internal detail.
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        error!(stage = "api", error = %err, "unexpected storage failure");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "internal server error",
        )
    }
}

impl From<ValidationErrors> for ProblemResponse {
    fn from(errors: ValidationErrors) -> Self {
        Self::validation(errors)
    }
}

impl IntoResponse for ProblemResponse {
    fn into_response(self) -> Response {
        let mut response = Json(self.body).into_response();
        *response.status_mut() = self.status;
        response.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderValue::from_static("application/problem+json"),
        );
        response
    }
}
