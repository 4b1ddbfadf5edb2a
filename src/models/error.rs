use core::fmt;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;

use super::dto::Message;

#[derive(Debug)]
pub struct Error {
    pub code: StatusCode,
    pub body: Json<Message>,
}

impl Error {
    pub fn new(code: StatusCode, message: &str) -> Self {
        Self {
            code,
            body: Json(Message::new(message)),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.code, self.body).into_response()
    }
}

impl From<(StatusCode, &str)> for Error {
    fn from((code, msg): (StatusCode, &str)) -> Self {
        Self::new(code, msg)
    }
}

impl From<sqlx::error::Error> for Error {
    fn from(error: sqlx::error::Error) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, &error.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, &error.to_string())
    }
}

impl From<argon2::password_hash::errors::Error> for Error {
    fn from(error: argon2::password_hash::errors::Error) -> Self {
        Self::new(StatusCode::BAD_REQUEST, &error.to_string())
    }
}

/// Failures seen by the panel's HTTP client
#[derive(Debug)]
pub enum ClientError {
    ReqwestError(reqwest::Error),
    JsonError(serde_json::Error),
    /// The server answered with a non-success status; `body` is its text verbatim
    ApiError {
        status: reqwest::StatusCode,
        body: String,
    },
}

impl ClientError {
    /// Response body of a non-success status, if this is one
    pub fn response_body(&self) -> Option<&str> {
        match self {
            ClientError::ApiError { body, .. } => Some(body),
            _ => None,
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::ReqwestError(e) => write!(f, "Reqwest error: {}", e),
            ClientError::JsonError(e) => write!(f, "JSON error: {}", e),
            ClientError::ApiError { status, body } => write!(f, "API error ({}): {}", status, body),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        ClientError::ReqwestError(error)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(error: serde_json::Error) -> Self {
        ClientError::JsonError(error)
    }
}
