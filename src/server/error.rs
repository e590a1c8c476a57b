//! 検出関数のエラー応答

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use snap_learn_common::ErrorBody;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// 不正なリクエスト (400)
    #[error("{0}")]
    BadRequest(String),

    /// APIキー未設定 (500)
    #[error("Server misconfiguration")]
    ServerMisconfigured,

    /// Gemini 呼び出し失敗 (502)
    #[error("Failed to analyze image")]
    UpstreamUnavailable,

    /// 想定外の内部エラー (500)
    #[error("Internal server error")]
    Internal(String),

    #[error("Method not allowed")]
    MethodNotAllowed,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ServerMisconfigured | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::UpstreamUnavailable => StatusCode::BAD_GATEWAY,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match &self {
            ApiError::Internal(details) => ErrorBody::new(self.to_string()).with_details(details.clone()),
            other => ErrorBody::new(other.to_string()),
        };

        (self.status(), Json(body)).into_response()
    }
}
