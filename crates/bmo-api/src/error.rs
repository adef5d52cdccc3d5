//! API error types and JSON error response formatting.
//!
//! ApiError provides a consistent JSON error response format across all
//! endpoints, mapping conversation errors to HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use bmo_chat::ChatError;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "not_found").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - missing or invalid parameters.
    BadRequest(String),
    /// 401 Unauthorized - the chat backend rejected our credentials.
    Unauthorized(String),
    /// 404 Not Found - resource does not exist.
    NotFound(String),
    /// 409 Conflict - state conflict.
    Conflict(String),
    /// 500 Internal Server Error - unexpected server error.
    Internal(String),
    /// 502 Bad Gateway - an upstream provider failed or misbehaved.
    BadGateway(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "bad_gateway", msg),
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        let message = err.to_string();
        match err {
            ChatError::UnknownSession(_) => ApiError::NotFound(message),
            ChatError::DuplicateSession(_) => ApiError::Conflict(message),
            ChatError::AuthConfiguration(_) => ApiError::Unauthorized(message),
            ChatError::UpstreamUnavailable(_)
            | ChatError::UpstreamContract(_)
            | ChatError::Synthesis(_) => ApiError::BadGateway(message),
            ChatError::Lock(_) => ApiError::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bmo_chat::ModelFailure;
    use uuid::Uuid;

    fn status_of(err: ChatError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_chat_error_status_mapping() {
        assert_eq!(
            status_of(ChatError::UnknownSession(Uuid::new_v4())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ChatError::DuplicateSession(Uuid::new_v4())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ChatError::AuthConfiguration("401".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(ChatError::UpstreamUnavailable(vec![ModelFailure {
                model: "m".into(),
                reason: "down".into(),
            }])),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(ChatError::UpstreamContract("bad json".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(ChatError::Synthesis("tts".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(ChatError::Lock("poisoned".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_message_is_preserved() {
        let api: ApiError = ChatError::Synthesis("voice offline".into()).into();
        assert!(matches!(api, ApiError::BadGateway(ref m) if m.contains("voice offline")));
    }
}
