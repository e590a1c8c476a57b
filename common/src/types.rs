//! 検出結果の型定義
//!
//! クライアントとサーバで共有されるワイヤ型:
//! - DetectRequest: クライアント → 検出関数のリクエストボディ
//! - DetectionResult: 検出関数が返す正規化済みの結果
//! - ErrorBody: 非2xx応答のボディ

use serde::{Deserialize, Serialize};

/// objectName が得られなかった場合のセンチネル値
pub const UNKNOWN_OBJECT: &str = "Unknown Object";

/// 検出関数へのリクエスト
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectRequest {
    /// プレフィックスなしのBase64 JPEG
    pub image: String,
}

/// 物体検出結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub object_name: String,

    /// 信頼度 (0-100)
    pub confidence: f64,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub additional_info: Vec<String>,
}

impl DetectionResult {
    /// 表示用に丸めた信頼度（パーセント）
    pub fn confidence_percent(&self) -> u8 {
        self.confidence.clamp(0.0, 100.0).round() as u8
    }
}

/// エラー応答
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}
