//! プロンプト生成モジュール
//!
//! 検出関数がビジョンモデルに渡す固定の指示文

use crate::types::UNKNOWN_OBJECT;

/// 期待するJSONの形（モデルへの例示）
const RESPONSE_SHAPE: &str = r#"{
  "objectName": "name of the main object",
  "confidence": 0-100,
  "description": "one or two sentences about the object",
  "additionalInfo": ["fact", "fact", "fact"]
}"#;

/// 物体検出プロンプト生成
///
/// # Returns
/// 画像と一緒に送る指示文
pub fn build_detection_prompt() -> String {
    format!(
        r#"Analyze this image and identify the main object in it.
Return ONLY a JSON object in this shape:
{}

Rules:
- "confidence" is a number between 0 and 100.
- "additionalInfo" holds 3 short, interesting facts about the object.
- If no object can be identified, use "{}" as objectName."#,
        RESPONSE_SHAPE, UNKNOWN_OBJECT
    )
}
