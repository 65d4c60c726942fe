//! JSON response envelope
//!
//! Success: `{"status": 200, "message": ..., "data": ...}`.
//! Failure: `{"status": N, "message": ..., "error": {"type": ..., "message": ...}}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::BridgeError;

/// Error categories reported in `error.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    Server,
    Validation,
    Authentication,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Server => "Server Error",
            ErrorType::Validation => "Validation Error",
            ErrorType::Authentication => "Authentication Error",
        }
    }
}

/// Successful response.
#[derive(Debug, Clone, Serialize)]
pub struct Success {
    pub status: u16,
    pub message: String,
    pub data: Value,
}

impl Success {
    pub fn new(message: impl Into<String>, data: impl Serialize) -> Result<Self, ApiError> {
        let data = serde_json::to_value(data)
            .map_err(|e| ApiError::server("Failed to encode response!", e.to_string()))?;
        Ok(Self {
            status: StatusCode::OK.as_u16(),
            message: message.into(),
            data,
        })
    }
}

impl IntoResponse for Success {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[derive(Debug, Clone, Serialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    kind: &'static str,
    message: String,
}

#[derive(Debug, Clone, Serialize)]
struct ErrorEnvelope {
    status: u16,
    message: String,
    error: ErrorBody,
}

/// Failed response.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub kind: ErrorType,
    pub error: String,
}

impl ApiError {
    pub fn server(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            kind: ErrorType::Server,
            error: error.into(),
        }
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "Bad Request".to_string(),
            kind: ErrorType::Validation,
            error: error.into(),
        }
    }

    pub fn forbidden(error: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: "Forbidden".to_string(),
            kind: ErrorType::Authentication,
            error: error.into(),
        }
    }

    /// Map a bridge error; `context` is the message for server errors.
    pub fn from_bridge(context: &str, err: BridgeError) -> Self {
        match err {
            BridgeError::FeatureDisabled(msg) => Self::forbidden(msg),
            BridgeError::InvalidInput(msg) => Self::bad_request(msg),
            other => {
                warn!(error = %other, "{}", context);
                Self::server(context, other.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorEnvelope {
            status: self.status.as_u16(),
            message: self.message,
            error: ErrorBody {
                kind: self.kind.as_str(),
                message: self.error,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Handler result
pub type ApiResult = Result<Success, ApiError>;
