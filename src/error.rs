use thiserror::Error;

/// カメラ取得・撮影のエラー（撮影画面内で表示し、再試行を促す）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Camera permission was denied. Please allow camera access and try again.")]
    PermissionDenied,

    #[error("No camera found on this device.")]
    DeviceNotFound,

    #[error("Unable to access camera: {0}")]
    DeviceUnavailable(String),

    #[error("Camera is not started")]
    NotAcquired,

    #[error("Failed to encode captured frame: {0}")]
    Encode(String),
}

/// 検出クライアントのエラー（エラー画面へ遷移する）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectionError {
    #[error("Analysis failed: {status} {reason}")]
    AnalysisFailed { status: u16, reason: String },

    #[error("Could not identify the object. Please try with a clearer image.")]
    UnrecognizedObject,

    #[error("Unexpected response from detection service: {0}")]
    MalformedResponse(String),

    #[error("Failed to analyze the image. Please check your connection and try again. ({0})")]
    NetworkFailure(String),
}

#[derive(Error, Debug)]
pub enum SnapError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Detection endpoint is not configured. Set it with `snap-learn config --set-endpoint URL` or SNAP_LEARN_ENDPOINT")]
    MissingEndpoint,

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Detection(#[from] DetectionError),

    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

pub type Result<T> = std::result::Result<T, SnapError>;
