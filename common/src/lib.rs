//! Snap & Learn Common Library
//!
//! クライアント側（検出クライアント）とサーバ側（検出関数）で共有される
//! 型・ユーティリティ

pub mod types;
pub mod error;
pub mod data_url;
pub mod parser;
pub mod prompts;

pub use types::{DetectRequest, DetectionResult, ErrorBody, UNKNOWN_OBJECT};
pub use error::{Error, Result};
pub use data_url::{encode_jpeg_data_url, extract_base64_from_data_url};
pub use parser::{extract_json_object, fallback_result, parse_model_reply, sanitize};
pub use prompts::build_detection_prompt;
