//! モデル応答パーサー
//!
//! ビジョンモデルの自由形式テキストからJSONオブジェクトを抽出し、
//! 常に整形済みの DetectionResult を返す。

use crate::error::{Error, Result};
use crate::types::{DetectionResult, UNKNOWN_OBJECT};
use regex::Regex;
use serde_json::{Map, Value};

/// パース失敗時のフォールバック信頼度
pub const FALLBACK_CONFIDENCE: f64 = 30.0;

/// confidence が数値でない場合の既定値
pub const DEFAULT_CONFIDENCE: f64 = 50.0;

/// フォールバック時に残す生テキストの最大文字数
pub const EXCERPT_CHARS: usize = 100;

lazy_static::lazy_static! {
    // 最初の '{' から最後の '}' まで（貪欲）
    static ref OBJECT_RE: Regex = Regex::new(r"(?s)\{.*\}").unwrap();
}

/// モデル応答から {...} 部分を抽出
///
/// # Examples
/// ```
/// use snap_learn_common::extract_json_object;
///
/// let reply = "Sure! {\"objectName\": \"Pen\"} Hope that helps.";
/// assert_eq!(extract_json_object(reply).unwrap(), "{\"objectName\": \"Pen\"}");
/// ```
pub fn extract_json_object(response: &str) -> Result<&str> {
    OBJECT_RE
        .find(response)
        .map(|m| m.as_str())
        .ok_or_else(|| Error::Parse("JSON object not found".into()))
}

/// モデル応答を DetectionResult に変換
///
/// {...} が無ければ応答全体をJSONとして解釈する。
/// どちらも失敗した場合は低信頼度のフォールバック結果を返す（エラーにはしない）。
pub fn parse_model_reply(raw: &str) -> DetectionResult {
    let candidate = extract_json_object(raw).unwrap_or(raw);

    match serde_json::from_str::<Value>(candidate) {
        Ok(value) => sanitize(&value),
        Err(_) => fallback_result(raw),
    }
}

/// パース不能な応答に対するフォールバック結果
pub fn fallback_result(raw: &str) -> DetectionResult {
    let excerpt: String = raw.chars().take(EXCERPT_CHARS).collect();

    DetectionResult {
        object_name: UNKNOWN_OBJECT.to_string(),
        confidence: FALLBACK_CONFIDENCE,
        description: "Could not parse AI response.".to_string(),
        additional_info: vec![format!("{}...", excerpt)],
    }
}

/// 任意のJSON値を整形済みの DetectionResult に正規化
///
/// - objectName: 空/欠落なら "Unknown Object"
/// - confidence: 数値なら [0,100] にクランプ、それ以外は 50
/// - description: 欠落なら空文字
/// - additionalInfo: 配列でなければ空
pub fn sanitize(value: &Value) -> DetectionResult {
    let empty = Map::new();
    let map = value.as_object().unwrap_or(&empty);

    let object_name = map
        .get("objectName")
        .and_then(truthy_string)
        .unwrap_or_else(|| UNKNOWN_OBJECT.to_string());

    let confidence = map
        .get("confidence")
        .and_then(Value::as_f64)
        .map(|c| c.clamp(0.0, 100.0))
        .unwrap_or(DEFAULT_CONFIDENCE);

    let description = map
        .get("description")
        .and_then(truthy_string)
        .unwrap_or_default();

    let additional_info = match map.get("additionalInfo") {
        Some(Value::Array(items)) => items.iter().map(item_string).collect(),
        _ => Vec::new(),
    };

    DetectionResult {
        object_name,
        confidence,
        description,
        additional_info,
    }
}

/// 空でない値だけを文字列化（null, false, 0, "" は None）
fn truthy_string(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

fn item_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // =============================================
    // extract_json_object テスト
    // =============================================

    #[test]
    fn test_extract_json_object_with_fence() {
        let response = "```json\n{\"objectName\": \"Mug\", \"confidence\": 90}\n```";
        let json = extract_json_object(response).unwrap();
        assert!(json.starts_with('{'));
        assert!(json.ends_with('}'));
        assert!(json.contains("Mug"));
    }

    #[test]
    fn test_extract_json_object_greedy() {
        let response = r#"{"objectName": "Pen", "extra": {"nested": true}} trailing"#;
        let json = extract_json_object(response).unwrap();
        assert_eq!(json, r#"{"objectName": "Pen", "extra": {"nested": true}}"#);
    }

    #[test]
    fn test_extract_json_object_error() {
        let result = extract_json_object("No JSON here, just plain text.");
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    // =============================================
    // parse_model_reply テスト
    // =============================================

    #[test]
    fn test_parse_model_reply_well_formed() {
        let reply = r#"Here is the result:
{
  "objectName": "Coffee Mug",
  "confidence": 87,
  "description": "A ceramic mug",
  "additionalInfo": ["Usually ceramic", "Has a handle"]
}"#;
        let result = parse_model_reply(reply);
        assert_eq!(result.object_name, "Coffee Mug");
        assert_eq!(result.confidence, 87.0);
        assert_eq!(result.description, "A ceramic mug");
        assert_eq!(result.additional_info.len(), 2);
    }

    #[test]
    fn test_parse_model_reply_plain_text_falls_back() {
        let reply = "I think this is a banana, but I'm not sure.";
        let result = parse_model_reply(reply);
        assert_eq!(result.object_name, UNKNOWN_OBJECT);
        assert_eq!(result.confidence, FALLBACK_CONFIDENCE);
        assert_eq!(result.description, "Could not parse AI response.");
        assert_eq!(result.additional_info, vec![format!("{}...", reply)]);
    }

    #[test]
    fn test_parse_model_reply_broken_object_falls_back() {
        let reply = "{ objectName: Mug, confidence: high }";
        let result = parse_model_reply(reply);
        assert_eq!(result.confidence, FALLBACK_CONFIDENCE);
    }

    #[test]
    fn test_fallback_excerpt_is_truncated() {
        let reply = "x".repeat(500);
        let result = fallback_result(&reply);
        let excerpt = &result.additional_info[0];
        assert_eq!(excerpt.chars().count(), EXCERPT_CHARS + 3);
        assert!(reply.starts_with(excerpt.trim_end_matches("...")));
    }

    #[test]
    fn test_fallback_excerpt_counts_chars() {
        // マルチバイト文字でも文字境界で切る
        let reply = "あ".repeat(150);
        let result = fallback_result(&reply);
        assert_eq!(result.additional_info[0].chars().count(), 103);
    }

    // =============================================
    // sanitize テスト
    // =============================================

    #[test]
    fn test_sanitize_clamps_confidence() {
        assert_eq!(sanitize(&json!({"confidence": 250})).confidence, 100.0);
        assert_eq!(sanitize(&json!({"confidence": -4.5})).confidence, 0.0);
        assert_eq!(sanitize(&json!({"confidence": 42.5})).confidence, 42.5);
    }

    #[test]
    fn test_sanitize_non_numeric_confidence() {
        assert_eq!(sanitize(&json!({"confidence": "90"})).confidence, DEFAULT_CONFIDENCE);
        assert_eq!(sanitize(&json!({})).confidence, DEFAULT_CONFIDENCE);
    }

    #[test]
    fn test_sanitize_defaults() {
        let result = sanitize(&json!({"objectName": "", "additionalInfo": "not a list"}));
        assert_eq!(result.object_name, UNKNOWN_OBJECT);
        assert_eq!(result.description, "");
        assert!(result.additional_info.is_empty());
    }

    #[test]
    fn test_sanitize_non_object_value() {
        let result = sanitize(&json!([1, 2, 3]));
        assert_eq!(result.object_name, UNKNOWN_OBJECT);
        assert_eq!(result.confidence, DEFAULT_CONFIDENCE);
    }

    #[test]
    fn test_sanitize_stringifies_info_items() {
        let result = sanitize(&json!({"objectName": "Die", "additionalInfo": ["six sides", 6]}));
        assert_eq!(result.additional_info, vec!["six sides".to_string(), "6".to_string()]);
    }

    #[test]
    fn test_sanitize_confidence_always_in_range() {
        for raw in [-1e9, -1.0, 0.0, 33.3, 100.0, 100.5, 1e12] {
            let c = sanitize(&json!({"confidence": raw})).confidence;
            assert!((0.0..=100.0).contains(&c), "confidence {} out of range", c);
        }
    }
}
