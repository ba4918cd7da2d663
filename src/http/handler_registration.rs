//! Handles /api/registration - partner application and user registration

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::Json as ResponseJson,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    errors::{PartnerTokenError, RegistrationError},
    http::context::AppState,
    registration::RegisteredUser,
};

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterApplicationResponse {
    pub registered: bool,
}

type ErrorResponse = (StatusCode, ResponseJson<Value>);

pub async fn register_application_handler(
    State(state): State<AppState>,
) -> Result<ResponseJson<RegisterApplicationResponse>, ErrorResponse> {
    match state.registration_service.register_application().await {
        Ok(()) => Ok(ResponseJson(RegisterApplicationResponse { registered: true })),
        Err(e) => Err(error_response(&e)),
    }
}

pub async fn register_user_handler(
    State(state): State<AppState>,
    Json(request): Json<RegisterUserRequest>,
) -> Result<ResponseJson<RegisteredUser>, ErrorResponse> {
    match state
        .registration_service
        .register_user(&request.username)
        .await
    {
        Ok(user) => Ok(ResponseJson(user)),
        Err(e) => Err(error_response(&e)),
    }
}

pub async fn delete_user_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, ErrorResponse> {
    match state.registration_service.delete_user(&user_id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(error_response(&e)),
    }
}

fn error_response(e: &RegistrationError) -> ErrorResponse {
    let (status, error_code, description) = match e {
        RegistrationError::InvalidUsername => {
            (StatusCode::BAD_REQUEST, "invalid_username", e.to_string())
        }
        RegistrationError::NotFound(_) => (StatusCode::NOT_FOUND, "user_not_found", e.to_string()),
        RegistrationError::RegistrationFailed { .. } => {
            (StatusCode::BAD_GATEWAY, "registration_failed", e.to_string())
        }
        RegistrationError::Token(PartnerTokenError::UpstreamUnreachable(_)) => (
            StatusCode::GATEWAY_TIMEOUT,
            "partner_unreachable",
            e.to_string(),
        ),
        RegistrationError::Token(PartnerTokenError::CredentialUnavailable(_))
        | RegistrationError::CredentialUnavailable(_)
        | RegistrationError::PersistenceFailed(_)
        | RegistrationError::UrlConstruction(_) => {
            tracing::error!(error = %e, "registration request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "server_error",
                "Internal server error".to_string(),
            )
        }
        RegistrationError::Token(_) => (
            StatusCode::BAD_GATEWAY,
            "partner_authentication_failed",
            e.to_string(),
        ),
    };

    (
        status,
        ResponseJson(json!({
            "error": error_code,
            "error_description": description
        })),
    )
}
