/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON body `{"status": false, "message": ...}`)
 * - 認証失敗時の WWW-Authenticate challenge もここで付与する
 */
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Challenge sent when no credential was supplied at all.
pub const MISSING_TOKEN_CHALLENGE: &str =
    "Newauth realm=\"apps\", type=1, title=\"Login to \"\"apps\"\"\", Basic realm=\"simple\"";

/// Challenge sent when a credential was supplied but could not be recognised.
pub const MALFORMED_TOKEN_CHALLENGE: &str = "Unrecognized token format";

#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub status: bool,
    pub message: String,
}

impl MessageBody {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AppError {
    // credential absent
    #[error("missing auth token")]
    MissingAuthToken,
    // credential malformed: bad header shape, bad signature, unparseable body
    #[error("Invalid/Malformed auth token")]
    MalformedAuthToken,
    // credential rejected: parsed and signed, but failed a secondary check
    #[error("Token is not valid")]
    InvalidToken,
    #[error("Invalid request")]
    InvalidRequest,
    #[error("not found")]
    NotFound,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingAuthToken | AppError::MalformedAuthToken => StatusCode::UNAUTHORIZED,
            AppError::InvalidToken => StatusCode::FORBIDDEN,
            AppError::InvalidRequest => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
        }
    }

    fn challenge(&self) -> Option<&'static str> {
        match self {
            AppError::MissingAuthToken => Some(MISSING_TOKEN_CHALLENGE),
            AppError::MalformedAuthToken => Some(MALFORMED_TOKEN_CHALLENGE),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let challenge = self.challenge();

        let mut response = (status, Json(MessageBody::failure(self.to_string()))).into_response();

        if let Some(challenge) = challenge {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(challenge),
            );
        }

        response
    }
}
