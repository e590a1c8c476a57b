//! 画像ファイル/フォルダをカメラとして扱うデバイス
//!
//! フォルダ直下の画像をファイル名順に1枚ずつフレームとして返す（末尾で先頭に戻る）。

use super::exif::{apply_orientation, read_orientation};
use super::{CameraDevice, CameraRequest, StreamInfo};
use crate::error::CaptureError;
use async_trait::async_trait;
use image::{DynamicImage, ImageError};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

#[derive(Debug)]
pub struct FileCamera {
    source: PathBuf,
    frames: Vec<PathBuf>,
    cursor: usize,
    open: bool,
}

impl FileCamera {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            frames: Vec::new(),
            cursor: 0,
            open: false,
        }
    }

    /// open 時に検出したフレーム一覧
    pub fn frames(&self) -> &[PathBuf] {
        &self.frames
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

#[async_trait]
impl CameraDevice for FileCamera {
    async fn open(&mut self, request: &CameraRequest) -> Result<StreamInfo, CaptureError> {
        let frames = scan_frames(&self.source)?;
        let first = &frames[0];

        // ネイティブ解像度で配信する（要求解像度はヒント扱い）
        let (width, height) = image::image_dimensions(first).map_err(map_image_error)?;

        debug!(
            source = %self.source.display(),
            frames = frames.len(),
            ideal_width = request.ideal_width,
            ideal_height = request.ideal_height,
            facing = ?request.facing,
            "file camera opened"
        );

        self.frames = frames;
        self.cursor = 0;
        self.open = true;

        Ok(StreamInfo {
            label: self.source.display().to_string(),
            width,
            height,
        })
    }

    fn grab_frame(&mut self) -> Result<DynamicImage, CaptureError> {
        if !self.open || self.frames.is_empty() {
            return Err(CaptureError::NotAcquired);
        }

        let path = self.frames[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.frames.len();

        let frame = image::open(&path).map_err(map_image_error)?;
        let frame = match read_orientation(&path) {
            Some(orientation) => apply_orientation(frame, orientation),
            None => frame,
        };

        info!(
            frame = %path.display(),
            width = frame.width(),
            height = frame.height(),
            "frame grabbed"
        );
        Ok(frame)
    }

    fn close(&mut self) {
        if self.open {
            debug!(source = %self.source.display(), "file camera closed");
        }
        self.open = false;
    }
}

/// ソースから画像ファイルを列挙（ファイル名順）
fn scan_frames(source: &Path) -> Result<Vec<PathBuf>, CaptureError> {
    let meta = std::fs::metadata(source).map_err(map_io_error)?;

    if meta.is_file() {
        return Ok(vec![source.to_path_buf()]);
    }

    // 権限エラーをここで拾う
    std::fs::read_dir(source).map_err(map_io_error)?;

    let mut frames: Vec<PathBuf> = WalkDir::new(source)
        .max_depth(1)  // 直下のみ
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && is_image_file(p))
        .collect();

    if frames.is_empty() {
        return Err(CaptureError::DeviceNotFound);
    }

    frames.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(frames)
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

fn map_io_error(err: io::Error) -> CaptureError {
    match err.kind() {
        io::ErrorKind::PermissionDenied => CaptureError::PermissionDenied,
        io::ErrorKind::NotFound => CaptureError::DeviceNotFound,
        _ => CaptureError::DeviceUnavailable(err.to_string()),
    }
}

fn map_image_error(err: ImageError) -> CaptureError {
    match err {
        ImageError::IoError(e) => map_io_error(e),
        other => CaptureError::DeviceUnavailable(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;

    fn write_image(path: &Path, width: u32, height: u32) {
        RgbImage::from_pixel(width, height, Rgb([10, 20, 30]))
            .save(path)
            .expect("画像保存失敗");
    }

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("a.jpg")));
        assert!(is_image_file(Path::new("a.JPEG")));
        assert!(is_image_file(Path::new("a.png")));
        assert!(!is_image_file(Path::new("a.txt")));
        assert!(!is_image_file(Path::new("noext")));
    }

    #[tokio::test]
    async fn test_open_missing_source() {
        let mut camera = FileCamera::new("/nonexistent/path/12345");
        let err = camera.open(&CameraRequest::default()).await.unwrap_err();
        assert_eq!(err, CaptureError::DeviceNotFound);
        assert!(!camera.is_open());
    }

    #[tokio::test]
    async fn test_open_folder_without_images() {
        let dir = tempdir().expect("Failed to create temp dir");
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();

        let mut camera = FileCamera::new(dir.path());
        let err = camera.open(&CameraRequest::default()).await.unwrap_err();
        assert_eq!(err, CaptureError::DeviceNotFound);
    }

    #[tokio::test]
    async fn test_open_undecodable_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"not an image").unwrap();

        let mut camera = FileCamera::new(&path);
        let err = camera.open(&CameraRequest::default()).await.unwrap_err();
        assert!(matches!(err, CaptureError::DeviceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_frames_cycle_in_name_order() {
        let dir = tempdir().expect("Failed to create temp dir");
        write_image(&dir.path().join("b.png"), 20, 10);
        write_image(&dir.path().join("a.png"), 40, 30);

        let mut camera = FileCamera::new(dir.path());
        let info = camera.open(&CameraRequest::default()).await.unwrap();
        assert_eq!((info.width, info.height), (40, 30));
        assert_eq!(camera.frames().len(), 2);

        assert_eq!(camera.grab_frame().unwrap().width(), 40);
        assert_eq!(camera.grab_frame().unwrap().width(), 20);
        // 末尾の次は先頭に戻る
        assert_eq!(camera.grab_frame().unwrap().width(), 40);
    }

    #[tokio::test]
    async fn test_grab_after_close() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("one.png");
        write_image(&path, 8, 8);

        let mut camera = FileCamera::new(&path);
        camera.open(&CameraRequest::default()).await.unwrap();
        camera.close();
        assert_eq!(camera.grab_frame().unwrap_err(), CaptureError::NotAcquired);
    }
}
