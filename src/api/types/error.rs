//! API error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::domain::account::ValidationErrors;
use crate::domain::DomainError;

/// Body of an error response: either a single message or per-field validation messages
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ApiErrorBody {
    Message {
        message: String,
    },
    Validation {
        #[serde(rename = "validationErrors")]
        validation_errors: ValidationErrors,
    },
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ApiErrorBody,
}

impl ApiError {
    /// Create an error carrying a single message
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiErrorBody::Message {
                message: message.into(),
            },
        }
    }

    /// Field validation failure
    pub fn validation(errors: ValidationErrors) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ApiErrorBody::Validation {
                validation_errors: errors,
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// An upstream dependency (mail delivery) failed
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn unsupported_media_type(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNSUPPORTED_MEDIA_TYPE, message)
    }

    /// The single message, if this is not a validation error
    pub fn message(&self) -> Option<&str> {
        match &self.body {
            ApiErrorBody::Message { message } => Some(message),
            ApiErrorBody::Validation { .. } => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        // The service turns an email conflict into a validation outcome, so any
        // error reaching this point is a server fault
        error!(error = %err, "Request failed with an internal error");
        Self::internal("Internal server error")
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.body {
            ApiErrorBody::Message { message } => write!(f, "{}: {}", self.status, message),
            ApiErrorBody::Validation { validation_errors } => {
                write!(f, "{}: {} invalid field(s)", self.status, validation_errors.len())
            }
        }
    }
}

impl std::error::Error for ApiError {}
