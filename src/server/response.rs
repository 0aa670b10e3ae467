//! JSON response envelope
//!
//! Every admin API response is `{status, data?, error?{code, message,
//! extra?}}` with the HTTP status mirroring the failure class.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl ApiResponse {
    /// Success without a payload.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            data: None,
            error: None,
        }
    }

    /// Success with a payload.
    pub fn data(value: impl Serialize) -> Self {
        Self {
            status: "ok".to_string(),
            data: Some(serde_json::to_value(value).unwrap_or(serde_json::Value::Null)),
            error: None,
        }
    }

    /// Failure with a category code and a terse message.
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            data: None,
            error: Some(ApiError {
                code: code.to_string(),
                message: message.into(),
                extra: None,
            }),
        }
    }

    /// Attach structured detail to an error response.
    pub fn extra(mut self, value: impl Serialize) -> Self {
        if let Some(ref mut error) = self.error {
            error.extra = Some(serde_json::to_value(value).unwrap_or(serde_json::Value::Null));
        }
        self
    }

    /// Keep the health payload visible even on the 500 path.
    pub fn with_data(mut self, value: impl Serialize) -> Self {
        self.data = Some(serde_json::to_value(value).unwrap_or(serde_json::Value::Null));
        self
    }

    fn respond(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }

    pub fn send_ok(self) -> Response {
        self.respond(StatusCode::OK)
    }

    pub fn bad_request(self) -> Response {
        self.respond(StatusCode::BAD_REQUEST)
    }

    pub fn unauthorized(self) -> Response {
        self.respond(StatusCode::UNAUTHORIZED)
    }

    pub fn forbidden(self) -> Response {
        self.respond(StatusCode::FORBIDDEN)
    }

    pub fn not_found(self) -> Response {
        self.respond(StatusCode::NOT_FOUND)
    }

    pub fn method_not_allowed(self) -> Response {
        self.respond(StatusCode::METHOD_NOT_ALLOWED)
    }

    pub fn internal_server_error(self) -> Response {
        self.respond(StatusCode::INTERNAL_SERVER_ERROR)
    }
}
