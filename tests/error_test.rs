//! エラーケーステスト
//!
//! 各種エラー条件でのエラーハンドリングを検証

use snap_learn::capture::{CaptureAdapter, FileCamera, FrameBounds};
use snap_learn::config::Config;
use snap_learn::error::{CaptureError, DetectionError, SnapError};
use std::path::Path;
use tempfile::tempdir;

/// 存在しないフォルダをカメラにした場合
#[tokio::test]
async fn test_camera_source_not_found() {
    let mut camera = CaptureAdapter::new(FileCamera::new("/nonexistent/path/12345"), FrameBounds::default());
    let err = camera.acquire().await.unwrap_err();
    assert_eq!(err, CaptureError::DeviceNotFound);
    assert!(!camera.is_acquired());
}

/// 画像のないフォルダをカメラにした場合
#[tokio::test]
async fn test_camera_source_without_images() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();

    let mut camera = CaptureAdapter::new(FileCamera::new(dir.path()), FrameBounds::default());
    assert_eq!(camera.acquire().await.unwrap_err(), CaptureError::DeviceNotFound);
}

/// 壊れた画像ファイル
#[tokio::test]
async fn test_camera_source_corrupt_image() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("broken.jpg"), b"not a jpeg").unwrap();

    let mut camera = CaptureAdapter::new(FileCamera::new(dir.path()), FrameBounds::default());
    let err = camera.acquire().await.unwrap_err();
    assert!(matches!(err, CaptureError::DeviceUnavailable(_)));
}

/// エンドポイント未設定
#[test]
fn test_missing_endpoint() {
    let dir = tempdir().expect("Failed to create temp dir");
    let config = Config::load_from(&dir.path().join("missing.json")).unwrap();
    assert!(matches!(config.endpoint(), Err(SnapError::MissingEndpoint)));
}

/// 壊れた設定ファイル
#[test]
fn test_corrupt_config_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ broken").unwrap();

    let err = Config::load_from(Path::new(&path)).unwrap_err();
    assert!(matches!(err, SnapError::JsonParse(_)));
}

/// エラーのDisplay実装確認
#[test]
fn test_error_display() {
    let errors: Vec<SnapError> = vec![
        SnapError::Config("bad value".to_string()),
        SnapError::MissingEndpoint,
        CaptureError::DeviceNotFound.into(),
        DetectionError::UnrecognizedObject.into(),
        SnapError::HttpClient("tls".to_string()),
    ];

    for err in errors {
        assert!(!err.to_string().is_empty());
    }
}

#[test]
fn test_user_facing_messages() {
    assert_eq!(
        DetectionError::AnalysisFailed {
            status: 502,
            reason: "Bad Gateway".into()
        }
        .to_string(),
        "Analysis failed: 502 Bad Gateway"
    );
    assert_eq!(
        DetectionError::UnrecognizedObject.to_string(),
        "Could not identify the object. Please try with a clearer image."
    );
    assert_eq!(CaptureError::DeviceNotFound.to_string(), "No camera found on this device.");

    // 変換後もメッセージはそのまま
    let wrapped: SnapError = CaptureError::PermissionDenied.into();
    assert_eq!(wrapped.to_string(), CaptureError::PermissionDenied.to_string());
}
