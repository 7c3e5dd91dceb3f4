//! Account registration and activation endpoints

use axum::{
    extract::{Path, State},
    routing::post,
    Router,
};
use serde::Deserialize;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, MessageResponse};
use crate::infrastructure::account::{ActivationOutcome, RegistrationOutcome, RegistrationRequest};

pub const USER_CREATED: &str = "user created";
pub const EMAIL_FAILURE: &str = "Email failure";
pub const ACCOUNT_ACTIVATED: &str = "Account is activated";
pub const INVALID_TOKEN: &str = "Invalid Token";

/// Sign-up body; null and absent fields are both `None`, unknown fields are ignored
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl From<RegisterUserRequest> for RegistrationRequest {
    fn from(request: RegisterUserRequest) -> Self {
        Self {
            username: request.username,
            email: request.email,
            password: request.password,
        }
    }
}

pub fn create_users_router() -> Router<AppState> {
    Router::new()
        .route("/users", post(register_user))
        .route("/users/token/{token}", post(activate_user))
}

/// POST /api/1.0/users
pub async fn register_user(
    State(state): State<AppState>,
    Json(request): Json<RegisterUserRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    match state.registration_service.register(request.into()).await? {
        RegistrationOutcome::Created(_) => Ok(Json(MessageResponse::new(USER_CREATED))),
        RegistrationOutcome::ValidationFailed(errors) => Err(ApiError::validation(errors)),
        RegistrationOutcome::NotificationFailed => Err(ApiError::bad_gateway(EMAIL_FAILURE)),
    }
}

/// POST /api/1.0/users/token/{token}
pub async fn activate_user(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    match state.registration_service.activate(&token).await? {
        ActivationOutcome::Activated(_) => Ok(Json(MessageResponse::new(ACCOUNT_ACTIVATED))),
        ActivationOutcome::InvalidToken => Err(ApiError::bad_request(INVALID_TOKEN)),
    }
}
