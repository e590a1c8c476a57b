//! 撮影アダプタ
//!
//! カメラデバイスの取得/解放と、フレーム → CapturedImage の変換を担当する。
//! デバイスはアダプタが排他的に保持し、Drop 時に必ず解放する。

mod exif;
mod file_camera;
mod frame;

pub use file_camera::FileCamera;
pub use frame::{encode_frame, scaled_dimensions, CapturedImage, FrameBounds};

use crate::error::CaptureError;
use async_trait::async_trait;
use image::DynamicImage;
use tracing::{debug, info, warn};

/// カメラの向き
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacingMode {
    /// 背面カメラ
    #[default]
    Environment,
    /// 前面カメラ
    User,
}

/// デバイスへの取得要求（理想解像度はヒント）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraRequest {
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub facing: FacingMode,
}

impl Default for CameraRequest {
    fn default() -> Self {
        Self {
            ideal_width: 1280,
            ideal_height: 720,
            facing: FacingMode::Environment,
        }
    }
}

impl CameraRequest {
    /// 前面カメラを要求するかどうかで向きを決める
    pub fn with_front(front: bool) -> Self {
        Self {
            facing: if front { FacingMode::User } else { FacingMode::Environment },
            ..Self::default()
        }
    }
}

/// 取得済みストリームの情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    pub label: String,
    pub width: u32,
    pub height: u32,
}

/// カメラデバイス
#[async_trait]
pub trait CameraDevice: Send {
    /// デバイスを開く
    ///
    /// 拒否 → PermissionDenied、デバイスなし → DeviceNotFound、
    /// その他 → DeviceUnavailable
    async fn open(&mut self, request: &CameraRequest) -> Result<StreamInfo, CaptureError>;

    /// 現在のプレビューフレームをネイティブ解像度で取得
    fn grab_frame(&mut self) -> Result<DynamicImage, CaptureError>;

    /// デバイスを停止・解放（冪等）
    fn close(&mut self);
}

/// 撮影アダプタ
pub struct CaptureAdapter<D: CameraDevice> {
    device: D,
    request: CameraRequest,
    bounds: FrameBounds,
    stream: Option<StreamInfo>,
    captured: Option<CapturedImage>,
}

impl<D: CameraDevice> CaptureAdapter<D> {
    pub fn new(device: D, bounds: FrameBounds) -> Self {
        Self {
            device,
            request: CameraRequest::default(),
            bounds,
            stream: None,
            captured: None,
        }
    }

    pub fn with_request(mut self, request: CameraRequest) -> Self {
        self.request = request;
        self
    }

    pub fn is_acquired(&self) -> bool {
        self.stream.is_some()
    }

    pub fn stream(&self) -> Option<&StreamInfo> {
        self.stream.as_ref()
    }

    pub fn captured(&self) -> Option<&CapturedImage> {
        self.captured.as_ref()
    }

    /// デバイスを取得してプレビューを開始
    ///
    /// 既に保持している場合は再要求しない。
    pub async fn acquire(&mut self) -> Result<StreamInfo, CaptureError> {
        if let Some(stream) = &self.stream {
            return Ok(stream.clone());
        }

        match self.device.open(&self.request).await {
            Ok(stream) => {
                info!(
                    device = %stream.label,
                    width = stream.width,
                    height = stream.height,
                    "camera acquired"
                );
                self.stream = Some(stream.clone());
                Ok(stream)
            }
            Err(e) => {
                warn!(error = %e, "camera acquisition failed");
                Err(e)
            }
        }
    }

    /// デバイスを解放（冪等）
    pub fn release(&mut self) {
        if self.stream.take().is_some() {
            self.device.close();
            debug!("camera released");
        }
    }

    /// 現在のフレームを撮影して上限サイズのJPEGに変換
    pub fn capture_frame(&mut self) -> Result<CapturedImage, CaptureError> {
        if self.stream.is_none() {
            return Err(CaptureError::NotAcquired);
        }

        let frame = self.device.grab_frame()?;
        let captured = encode_frame(&frame, &self.bounds)?;

        info!(
            source_width = frame.width(),
            source_height = frame.height(),
            width = captured.width,
            height = captured.height,
            payload_bytes = captured.payload_len(),
            "frame captured"
        );

        self.captured = Some(captured.clone());
        Ok(captured)
    }

    /// 撮影済み画像を破棄してプレビューに戻る
    ///
    /// デバイスを保持していれば再要求しない。
    pub async fn retake(&mut self) -> Result<(), CaptureError> {
        self.captured = None;
        self.acquire().await.map(|_| ())
    }

    /// 撮影済み画像を破棄（デバイスはそのまま）
    pub fn discard(&mut self) {
        self.captured = None;
    }
}

impl<D: CameraDevice> Drop for CaptureAdapter<D> {
    fn drop(&mut self) {
        self.release();
    }
}
