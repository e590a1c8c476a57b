//! Data URL ユーティリティ
//!
//! "data:image/jpeg;base64,/9j/4AAQ..." 形式の文字列の組み立てと分解

/// JPEG のMIMEタイプ
pub const JPEG_MIME: &str = "image/jpeg";

/// Data URLからBase64データ部分を抽出
///
/// # Arguments
/// * `data_url` - "data:image/jpeg;base64,/9j/4AAQ..." 形式のData URL
///
/// # Returns
/// Base64エンコードされたデータ部分、または抽出失敗時はNone
pub fn extract_base64_from_data_url(data_url: &str) -> Option<&str> {
    data_url.split(',').nth(1)
}

/// Base64済みのJPEGデータからData URLを組み立てる
pub fn encode_jpeg_data_url(base64_data: &str) -> String {
    format!("data:{};base64,{}", JPEG_MIME, base64_data)
}
