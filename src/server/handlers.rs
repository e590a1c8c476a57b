use super::error::ApiError;
use super::gemini::UpstreamError;
use super::ServerState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use snap_learn_common::{parse_model_reply, DetectionResult, UNKNOWN_OBJECT};
use tracing::{error, info, warn};

/// モデルがテキストを返さなかった場合の応答（200）
#[derive(Debug, Serialize)]
struct PlaceholderBody {
    error: &'static str,
    #[serde(flatten)]
    result: DetectionResult,
}

/// POST /detect-objects
pub async fn detect_objects(State(state): State<ServerState>, body: Bytes) -> Result<Response, ApiError> {
    let request: Value = serde_json::from_slice(&body)
        .map_err(|_| ApiError::BadRequest("Invalid JSON in request body".into()))?;

    let image = request
        .get("image")
        .and_then(Value::as_str)
        .filter(|image| !image.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Image data is required".into()))?;

    let Some(api_key) = state.google_api_key.as_deref() else {
        error!("GOOGLE_API_KEY not set");
        return Err(ApiError::ServerMisconfigured);
    };

    let reply = state.gemini.identify(api_key, image).await.map_err(|e| match e {
        UpstreamError::Transport(_) | UpstreamError::Status { .. } => {
            warn!(error = %e, "upstream failure");
            ApiError::UpstreamUnavailable
        }
        UpstreamError::Decode(details) => {
            error!(details = %details, "handler error");
            ApiError::Internal(details)
        }
    })?;

    let Some(raw_text) = reply else {
        warn!("model returned no text");
        let body = PlaceholderBody {
            error: "No response from Gemini API",
            result: DetectionResult {
                object_name: UNKNOWN_OBJECT.to_string(),
                confidence: 0.0,
                description: "No analysis available".to_string(),
                additional_info: vec![],
            },
        };
        return Ok((StatusCode::OK, Json(body)).into_response());
    };

    let result = parse_model_reply(&raw_text);
    info!(
        object = %result.object_name,
        confidence = result.confidence,
        "detection normalized"
    );

    Ok(Json(result).into_response())
}

/// OPTIONS /detect-objects（CORSヘッダはレイヤで付与）
pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
