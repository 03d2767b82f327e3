use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use log::error;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::utils::helpers::service_name;

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CustomError {
    #[error("Validation failed")]
    ValidationError(Vec<FieldError>),

    #[error("{0}")]
    BadRequestError(String),

    #[error("{0}")]
    AuthenticationError(String),

    #[error("{0}")]
    InvalidTokenError(String),

    #[error("{0}")]
    AuthorizationError(String),

    #[error("{0}")]
    NotFoundError(String),

    #[error("{0}")]
    ConflictError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("{0}")]
    InternalServerError(String),
}

impl CustomError {
    fn error_type(&self) -> &'static str {
        match self {
            CustomError::ValidationError(..) => "VALIDATION_ERROR",
            CustomError::BadRequestError(..) => "BAD_REQUEST_ERROR",
            CustomError::AuthenticationError(..) => "UNAUTHENTICATED_ERROR",
            CustomError::InvalidTokenError(..) => "INVALID_TOKEN_ERROR",
            CustomError::AuthorizationError(..) => "UNAUTHORIZED_ERROR",
            CustomError::NotFoundError(..) => "NOT_FOUND_ERROR",
            CustomError::ConflictError(..) => "CONFLICT_ERROR",
            CustomError::StorageError(..) => "STORAGE_ERROR",
            CustomError::InternalServerError(..) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Message safe to hand back to a client. Server faults never leak detail.
    fn public_message(&self) -> String {
        match self {
            CustomError::StorageError(..) | CustomError::InternalServerError(..) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl ResponseError for CustomError {
    fn status_code(&self) -> StatusCode {
        match *self {
            CustomError::ValidationError(..) => StatusCode::BAD_REQUEST,
            CustomError::BadRequestError(..) => StatusCode::BAD_REQUEST,
            CustomError::AuthenticationError(..) => StatusCode::UNAUTHORIZED,
            CustomError::InvalidTokenError(..) => StatusCode::FORBIDDEN,
            CustomError::AuthorizationError(..) => StatusCode::FORBIDDEN,
            CustomError::NotFoundError(..) => StatusCode::NOT_FOUND,
            CustomError::ConflictError(..) => StatusCode::CONFLICT,
            CustomError::StorageError(..) => StatusCode::INTERNAL_SERVER_ERROR,
            CustomError::InternalServerError(..) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}", self);
        }

        let mut body = json!({
            "success": false,
            "error": self.public_message(),
            "errorType": self.error_type(),
            "httpStatusCode": status.as_u16(),
            "service": service_name(),
        });

        if let CustomError::ValidationError(errors) = self {
            body["errors"] = json!(errors);
        }

        HttpResponse::build(status).json(body)
    }
}
