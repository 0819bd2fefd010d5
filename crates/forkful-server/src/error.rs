use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use forkful_shared::order::PricingError;
use forkful_shared::{PasswordError, TokenError, TransitionError, ValidationErrors};
use forkful_store::StoreError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("{message}")]
    Unauthenticated { code: &'static str, message: String },

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Too many requests, slow down")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Attached to 500 responses so a development-mode layer can surface the
/// underlying error text.
#[derive(Debug, Clone)]
pub struct InternalDetail(pub String);

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: String,
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a ValidationErrors>,
}

impl ServerError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ServerError::Validation(ValidationErrors::single(field, message))
    }

    pub fn invalid_credentials() -> Self {
        ServerError::Unauthenticated {
            code: "INVALID_CREDENTIALS",
            message: "Invalid email or password".to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Validation(_) => StatusCode::BAD_REQUEST,
            ServerError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            ServerError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ServerError::Validation(_) => "VALIDATION_ERROR",
            ServerError::Unauthenticated { code, .. } => *code,
            ServerError::Forbidden(_) => "FORBIDDEN",
            ServerError::NotFound(_) => "NOT_FOUND",
            ServerError::RateLimited => "RATE_LIMITED",
            ServerError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let (message, details) = match &self {
            ServerError::Validation(errors) => (
                errors
                    .errors()
                    .first()
                    .map(|e| e.message.clone())
                    .unwrap_or_else(|| "Validation failed".to_string()),
                Some(errors),
            ),
            ServerError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed");
                ("Internal server error".to_string(), None)
            }
            other => (other.to_string(), None),
        };

        let body = ErrorBody {
            message,
            code,
            details,
        };
        let mut response = (status, axum::Json(body)).into_response();

        if let ServerError::Internal(detail) = self {
            response.extensions_mut().insert(InternalDetail(detail));
        }
        response
    }
}

impl From<ValidationErrors> for ServerError {
    fn from(errors: ValidationErrors) -> Self {
        ServerError::Validation(errors)
    }
}

impl From<TokenError> for ServerError {
    fn from(e: TokenError) -> Self {
        ServerError::Unauthenticated {
            code: e.code(),
            message: e.to_string(),
        }
    }
}

impl From<TransitionError> for ServerError {
    fn from(e: TransitionError) -> Self {
        ServerError::validation("status", e.to_string())
    }
}

impl From<PricingError> for ServerError {
    fn from(e: PricingError) -> Self {
        match e {
            PricingError::UnknownMenuItem(id) => {
                ServerError::NotFound(format!("Menu item {id} not found"))
            }
            PricingError::Invalid(errors) => ServerError::Validation(errors),
        }
    }
}

impl From<PasswordError> for ServerError {
    fn from(e: PasswordError) -> Self {
        ServerError::Internal(e.to_string())
    }
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => ServerError::NotFound("Record not found".to_string()),
            StoreError::Duplicate("email") => ServerError::validation("email", "Email already in use"),
            StoreError::Duplicate(field) => {
                ServerError::validation(field, format!("{field} already in use"))
            }
            StoreError::Invalid(errors) => ServerError::Validation(errors),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::validation("body", rejection.body_text())
    }
}

impl From<tokio::task::JoinError> for ServerError {
    fn from(e: tokio::task::JoinError) -> Self {
        ServerError::Internal(e.to_string())
    }
}
