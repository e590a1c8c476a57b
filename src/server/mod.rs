//! 検出関数サーバ
//!
//! クライアントから受け取った画像を Gemini に転送し、
//! 応答を常に整形済みの DetectionResult に正規化して返す。
//!
//! ## エンドポイント
//! - `POST /detect-objects`: `{ "image": base64 }` → DetectionResult
//! - `OPTIONS /detect-objects`: CORS プリフライト (204)

pub mod error;
pub mod gemini;
mod handlers;

use crate::config::Config;
use axum::http::{header, HeaderValue};
use axum::routing::post;
use axum::Router;
use gemini::GeminiClient;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub const DETECT_PATH: &str = "/detect-objects";

/// ハンドラ共有状態
#[derive(Clone)]
pub struct ServerState {
    pub gemini: GeminiClient,
    /// 未設定ならリクエスト時に 500 を返す
    pub google_api_key: Option<String>,
}

impl ServerState {
    pub fn from_config(config: &Config) -> Self {
        Self {
            gemini: GeminiClient::new(reqwest::Client::new(), config.gemini_api_url.clone()),
            google_api_key: config.google_api_key.clone(),
        }
    }
}

/// ルータ構成（全応答にCORSヘッダを付与）
pub fn router(state: ServerState) -> Router {
    let detect = post(handlers::detect_objects)
        .options(handlers::preflight)
        .fallback(handlers::method_not_allowed);

    Router::new()
        .route(DETECT_PATH, detect)
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type, Authorization"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 指定アドレスで待ち受け、shutdown が完了するまで実行
pub async fn serve<F>(listener: TcpListener, state: ServerState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr: SocketAddr = listener.local_addr()?;
    info!("detection server listening on http://{}{}", addr, DETECT_PATH);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("detection server stopped");
    Ok(())
}
