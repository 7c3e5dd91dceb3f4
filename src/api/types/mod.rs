//! Request and response types shared by the HTTP handlers

pub mod error;
pub mod json;

use serde::Serialize;

pub use error::{ApiError, ApiErrorBody};
pub use json::Json;

/// Plain `{ "message": ... }` response body
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
