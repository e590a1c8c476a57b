//! 検出クライアント
//!
//! 撮影画像を検出関数に1回だけPOSTし、結果を型付きで返す。
//! リトライ・キャッシュ・バッチは行わない。

use crate::capture::CapturedImage;
use crate::error::{DetectionError, Result, SnapError};
use async_trait::async_trait;
use serde::Deserialize;
use snap_learn_common::{DetectRequest, DetectionResult};
use std::time::Duration;
use tracing::{debug, error, info};

/// 画像から物体を検出するもの
#[async_trait]
pub trait Detector: Send + Sync {
    async fn detect(&self, image: &CapturedImage) -> std::result::Result<DetectionResult, DetectionError>;
}

/// 検出関数の成功レスポンス（欠けたフィールドはクライアント側で補完）
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResult {
    #[serde(default)]
    object_name: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    additional_info: Option<Vec<String>>,
}

/// HTTP検出クライアント
#[derive(Debug, Clone)]
pub struct DetectionClient {
    http: reqwest::Client,
    endpoint: String,
    /// Bearerトークン
    api_token: Option<String>,
}

impl DetectionClient {
    pub fn new(endpoint: impl Into<String>, api_token: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| SnapError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            api_token,
        })
    }

    /// 画像を送信して結果を取得
    pub async fn detect(&self, image: &CapturedImage) -> std::result::Result<DetectionResult, DetectionError> {
        let body = DetectRequest {
            image: image.base64_payload().to_string(),
        };

        debug!(
            endpoint = %self.endpoint,
            payload_bytes = body.image.len(),
            "sending detection request"
        );

        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DetectionError::NetworkFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %error_text, "detection API error");
            return Err(DetectionError::AnalysisFailed {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| DetectionError::NetworkFailure(e.to_string()))?;

        let result = parse_detection_body(&text)?;
        info!(
            object = %result.object_name,
            confidence = result.confidence,
            "detection finished"
        );
        Ok(result)
    }
}

#[async_trait]
impl Detector for DetectionClient {
    async fn detect(&self, image: &CapturedImage) -> std::result::Result<DetectionResult, DetectionError> {
        DetectionClient::detect(self, image).await
    }
}

/// 成功レスポンスのボディを DetectionResult に変換
fn parse_detection_body(text: &str) -> std::result::Result<DetectionResult, DetectionError> {
    let wire: WireResult = serde_json::from_str(text)
        .map_err(|e| DetectionError::MalformedResponse(e.to_string()))?;

    let object_name = wire
        .object_name
        .filter(|name| !name.is_empty())
        .ok_or(DetectionError::UnrecognizedObject)?;

    Ok(DetectionResult {
        object_name,
        confidence: wire.confidence.unwrap_or(0.0),
        description: wire
            .description
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| "No description available.".to_string()),
        additional_info: wire.additional_info.unwrap_or_default(),
    })
}

/// デモ用の検出器（固定結果を一定時間後に返す）
#[derive(Debug, Clone)]
pub struct DemoDetector {
    delay: Duration,
}

impl DemoDetector {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for DemoDetector {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

#[async_trait]
impl Detector for DemoDetector {
    async fn detect(&self, _image: &CapturedImage) -> std::result::Result<DetectionResult, DetectionError> {
        tokio::time::sleep(self.delay).await;

        Ok(DetectionResult {
            object_name: "Coffee Mug".to_string(),
            confidence: 87.0,
            description: "A ceramic coffee mug, typically used for serving hot drinks such as coffee, tea or hot chocolate.".to_string(),
            additional_info: vec![
                "Coffee mugs are usually made from ceramic, porcelain or stoneware".to_string(),
                "The handle keeps fingers away from the hot surface".to_string(),
                "A standard mug holds between 8 and 12 fluid ounces".to_string(),
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn sample_image() -> CapturedImage {
        CapturedImage {
            data_url: "data:image/jpeg;base64,/9j/4AAQSkZJRg==".into(),
            width: 800,
            height: 600,
        }
    }

    fn client_for(server: &mockito::ServerGuard) -> DetectionClient {
        DetectionClient::new(format!("{}/detect-objects", server.url()), Some("anon-token".into())).unwrap()
    }

    #[test]
    fn test_parse_body_defaults() {
        let result = parse_detection_body(r#"{"objectName": "Pen"}"#).unwrap();
        assert_eq!(result.object_name, "Pen");
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.description, "No description available.");
        assert!(result.additional_info.is_empty());
    }

    #[test]
    fn test_parse_body_missing_object_name() {
        let err = parse_detection_body(r#"{"confidence": 50}"#).unwrap_err();
        assert_eq!(err, DetectionError::UnrecognizedObject);

        let err = parse_detection_body(r#"{"objectName": ""}"#).unwrap_err();
        assert_eq!(err, DetectionError::UnrecognizedObject);
    }

    #[test]
    fn test_parse_body_not_json() {
        let err = parse_detection_body("<html>oops</html>").unwrap_err();
        assert!(matches!(err, DetectionError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_detect_sends_stripped_payload_and_bearer() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/detect-objects")
            .match_header("authorization", "Bearer anon-token")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(serde_json::json!({"image": "/9j/4AAQSkZJRg=="})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"objectName":"Coffee Mug","confidence":87,"description":"A mug","additionalInfo":["ceramic"]}"#)
            .expect(1)
            .create_async()
            .await;

        let result = client_for(&server).detect(&sample_image()).await.unwrap();
        assert_eq!(result.object_name, "Coffee Mug");
        assert_eq!(result.confidence, 87.0);
        assert_eq!(result.additional_info, vec!["ceramic".to_string()]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_detect_without_token_sends_no_auth_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/detect-objects")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"objectName":"Pen"}"#)
            .create_async()
            .await;

        let client = DetectionClient::new(format!("{}/detect-objects", server.url()), None).unwrap();
        client.detect(&sample_image()).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_detect_bad_gateway() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/detect-objects")
            .with_status(502)
            .with_body(r#"{"error":"Failed to analyze image"}"#)
            .create_async()
            .await;

        let err = client_for(&server).detect(&sample_image()).await.unwrap_err();
        assert_eq!(
            err,
            DetectionError::AnalysisFailed {
                status: 502,
                reason: "Bad Gateway".into()
            }
        );
        assert_eq!(err.to_string(), "Analysis failed: 502 Bad Gateway");
    }

    #[tokio::test]
    async fn test_detect_unrecognized_object() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/detect-objects")
            .with_status(200)
            .with_body(r#"{"confidence": 10}"#)
            .create_async()
            .await;

        let err = client_for(&server).detect(&sample_image()).await.unwrap_err();
        assert_eq!(err, DetectionError::UnrecognizedObject);
    }

    #[tokio::test]
    async fn test_detect_network_failure() {
        // 接続できないポート
        let client = DetectionClient::new("http://127.0.0.1:9/detect-objects", None).unwrap();
        let err = client.detect(&sample_image()).await.unwrap_err();
        assert!(matches!(err, DetectionError::NetworkFailure(_)));
    }

    #[tokio::test]
    async fn test_demo_detector() {
        let detector = DemoDetector::new(Duration::from_millis(1));
        let result = detector.detect(&sample_image()).await.unwrap();
        assert_eq!(result.object_name, "Coffee Mug");
        assert_eq!(result.additional_info.len(), 3);
    }
}
