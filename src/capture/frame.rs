//! 撮影フレームの縮小・JPEGエンコード

use crate::error::CaptureError;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use snap_learn_common::{encode_jpeg_data_url, extract_base64_from_data_url};

/// 出力画像の上限サイズとJPEG品質
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBounds {
    pub max_width: u32,
    pub max_height: u32,
    /// JPEG品質 (1-100)
    pub jpeg_quality: u8,
}

impl Default for FrameBounds {
    fn default() -> Self {
        Self {
            max_width: 800,
            max_height: 600,
            jpeg_quality: 80,
        }
    }
}

/// 撮影済み画像（Base64 JPEG の Data URL）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub data_url: String,
    pub width: u32,
    pub height: u32,
}

impl CapturedImage {
    /// "data:image/jpeg;base64," を除いたBase64部分
    pub fn base64_payload(&self) -> &str {
        extract_base64_from_data_url(&self.data_url).unwrap_or(&self.data_url)
    }

    /// 送信サイズ（Base64文字数）
    pub fn payload_len(&self) -> usize {
        self.base64_payload().len()
    }
}

/// 上限に収まるよう縦横比を保って縮小した寸法
///
/// 上限以内ならそのまま。超える場合は min(max_w/w, max_h/h) 倍し、
/// 小数は切り捨てる（最小1px）。
pub fn scaled_dimensions(width: u32, height: u32, bounds: &FrameBounds) -> (u32, u32) {
    if width <= bounds.max_width && height <= bounds.max_height {
        return (width, height);
    }

    let ratio = f64::min(
        bounds.max_width as f64 / width as f64,
        bounds.max_height as f64 / height as f64,
    );

    // 浮動小数点誤差で 799.9999 → 799 にならないよう僅かに補正
    let scale = |v: u32, max: u32| -> u32 {
        let scaled = (v as f64 * ratio + 1e-6).floor() as u32;
        scaled.clamp(1, max.max(1))
    };

    (scale(width, bounds.max_width), scale(height, bounds.max_height))
}

/// フレームを縮小してJPEGにエンコードし、Data URLを返す
///
/// 同じフレーム・同じ上限なら出力は常に同一。
pub fn encode_frame(frame: &DynamicImage, bounds: &FrameBounds) -> Result<CapturedImage, CaptureError> {
    let (width, height) = scaled_dimensions(frame.width(), frame.height(), bounds);

    let rgb = frame.to_rgb8();
    let rgb = if (width, height) == (frame.width(), frame.height()) {
        rgb
    } else {
        image::imageops::resize(&rgb, width, height, FilterType::Triangle)
    };

    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, bounds.jpeg_quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| CaptureError::Encode(e.to_string()))?;

    let encoded = base64::engine::general_purpose::STANDARD.encode(&buf);

    Ok(CapturedImage {
        data_url: encode_jpeg_data_url(&encoded),
        width,
        height,
    })
}
