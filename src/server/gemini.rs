//! Gemini API連携
//!
//! 画像 + 固定プロンプトを送信し、候補テキストを返す。

use serde::{Deserialize, Serialize};
use snap_learn_common::build_detection_prompt;
use snap_learn_common::data_url::JPEG_MIME;
use thiserror::Error;
use tracing::{debug, error};

/// Gemini APIリクエスト
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.4,
            top_k: 32,
            top_p: 1.0,
            max_output_tokens: 1024,
        }
    }
}

/// Gemini APIレスポンス（欠けた階層は None として扱う）
#[derive(Debug, Default, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
            .filter(|t| !t.is_empty())
    }
}

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("upstream transport error: {0}")]
    Transport(String),

    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("upstream response could not be decoded: {0}")]
    Decode(String),
}

/// Gemini クライアント
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_url: String,
    generation: GenerationConfig,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            http,
            api_url: api_url.into(),
            generation: GenerationConfig::default(),
        }
    }

    /// 画像を解析して候補テキストを返す
    ///
    /// # Arguments
    /// * `api_key` - Gemini API key（クエリパラメータで渡す）
    /// * `image_base64` - プレフィックスなしのBase64 JPEG
    ///
    /// # Returns
    /// 候補テキスト。モデルがテキストを返さなかった場合は None
    pub async fn identify(&self, api_key: &str, image_base64: &str) -> Result<Option<String>, UpstreamError> {
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: build_detection_prompt(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: JPEG_MIME.to_string(),
                            data: image_base64.to_string(),
                        },
                    },
                ],
            }],
            generation_config: self.generation,
        };

        debug!(payload_bytes = image_base64.len(), "calling Gemini");

        let response = self
            .http
            .post(&self.api_url)
            // URLにキーが載るため、エラー文字列には URL を含めない
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %body, "Gemini API error");
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::Decode(e.without_url().to_string()))?;

        Ok(parsed.first_text())
    }
}
