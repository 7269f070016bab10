//! Shared helpers for the API handlers.

use axum::extract::FromRequestParts;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use rafiq_core::{EngagementError, UserId};
use serde::Serialize;

/// Header carrying the user id established by the authenticating gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Build a JSON error response.
pub fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({ "error": message.into() });
    (status, axum::Json(body)).into_response()
}

pub fn error_response(err: EngagementError) -> Response {
    match err {
        EngagementError::Validation(msg) => api_error(StatusCode::BAD_REQUEST, msg),
        EngagementError::NotFound(msg) => api_error(StatusCode::NOT_FOUND, msg),
        EngagementError::Forbidden(msg) => api_error(StatusCode::FORBIDDEN, msg),
        EngagementError::Duplicate(msg) => api_error(StatusCode::CONFLICT, msg),
        EngagementError::Store(source) => {
            tracing::error!(error = %source, "store operation failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
        }
    }
}

/// `200 OK` with the serialized value, or the mapped error.
pub fn json_result<T: Serialize>(result: rafiq_core::Result<T>) -> Response {
    match result {
        Ok(value) => axum::Json(value).into_response(),
        Err(e) => error_response(e),
    }
}

pub fn message(text: &str) -> Response {
    axum::Json(serde_json::json!({ "message": text })).into_response()
}

pub fn bad_body(rejection: JsonRejection) -> Response {
    api_error(StatusCode::BAD_REQUEST, rejection.body_text())
}

/// The authenticated caller, taken from [`USER_ID_HEADER`].
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub UserId);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(raw) = parts.headers.get(USER_ID_HEADER) else {
            return Err(api_error(StatusCode::UNAUTHORIZED, "missing caller identity"));
        };
        raw.to_str()
            .ok()
            .and_then(|v| v.trim().parse::<UserId>().ok())
            .map(Caller)
            .ok_or_else(|| api_error(StatusCode::UNAUTHORIZED, "invalid caller identity"))
    }
}
