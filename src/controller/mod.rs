//! アプリケーション状態機械
//!
//! 遷移は純粋関数 `transition` に集約し、副作用は `Effect` として返す。
//! 実行は `App`（executor）が担当する。
//!
//! ```text
//! Landing --start--> Capturing --analyze--> Analyzing --success--> Results
//!                                                     --failure--> Error
//! Results --takeAnother--> Capturing, Results --startOver--> Landing
//! Error --retry--> Landing
//! ```

mod app;

pub use app::App;

use crate::capture::CapturedImage;
use snap_learn_common::DetectionResult;

/// 検出リクエストの識別子（古い結果を捨てるために使う）
pub type RequestId = u64;

/// 画面状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppState {
    #[default]
    Landing,
    Capturing,
    Analyzing,
    Results,
    Error,
}

/// 状態機械が保持するモデル
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    pub state: AppState,
    pub captured_image: Option<CapturedImage>,
    pub detection_result: Option<DetectionResult>,
    /// 検出エラー（エラー画面で表示）
    pub error: Option<String>,
    /// カメラエラー（撮影画面内で表示）
    pub camera_error: Option<String>,
    /// 実行中の検出
    pub pending_request: Option<RequestId>,
    next_request: RequestId,
}

impl Model {
    pub fn is_busy(&self) -> bool {
        self.pending_request.is_some()
    }

    /// 全データを破棄して Landing に戻す
    fn reset(self) -> Self {
        Model {
            next_request: self.next_request,
            ..Model::default()
        }
    }
}

/// 入力イベント
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// 「物体を検出」
    Start,
    /// カメラ取得失敗
    CameraFailed(String),
    /// カメラ再試行
    RetryCamera,
    /// シャッター
    Shutter,
    /// 撮影完了
    ImageCaptured(CapturedImage),
    /// 撮り直し
    Retake,
    /// 解析開始
    Analyze,
    DetectionSucceeded { request: RequestId, result: DetectionResult },
    DetectionFailed { request: RequestId, message: String },
    TakeAnother,
    StartOver,
    /// エラー画面からやり直し
    Retry,
    /// 撮影画面から戻る
    Back,
}

/// 実行すべき副作用
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    AcquireCamera,
    ReleaseCamera,
    CaptureFrame,
    ResumePreview,
    StartDetection { request: RequestId, image: CapturedImage },
    CancelDetection { request: RequestId },
}

/// 状態遷移
///
/// 定義されていない (状態, イベント) の組み合わせは何もしない。
pub fn transition(model: Model, event: Event) -> (Model, Vec<Effect>) {
    use AppState::*;

    match (model.state, event) {
        (Landing, Event::Start) => (
            Model {
                state: Capturing,
                error: None,
                camera_error: None,
                ..model
            },
            vec![Effect::AcquireCamera],
        ),

        (Capturing, Event::CameraFailed(message)) => (
            Model {
                camera_error: Some(message),
                ..model
            },
            vec![],
        ),

        (Capturing, Event::RetryCamera) => (
            Model {
                camera_error: None,
                ..model
            },
            vec![Effect::AcquireCamera],
        ),

        (Capturing, Event::Shutter) if model.captured_image.is_none() && model.camera_error.is_none() => {
            (model, vec![Effect::CaptureFrame])
        }

        (Capturing, Event::ImageCaptured(image)) => (
            Model {
                captured_image: Some(image),
                ..model
            },
            vec![],
        ),

        (Capturing, Event::Retake) => (
            Model {
                captured_image: None,
                ..model
            },
            vec![Effect::ResumePreview],
        ),

        (Capturing, Event::Analyze) => match model.captured_image.clone() {
            Some(image) => {
                let request = model.next_request;
                (
                    Model {
                        state: Analyzing,
                        pending_request: Some(request),
                        next_request: request + 1,
                        ..model
                    },
                    vec![Effect::ReleaseCamera, Effect::StartDetection { request, image }],
                )
            }
            None => (model, vec![]),
        },

        (Capturing, Event::Back) => (model.reset(), vec![Effect::ReleaseCamera]),

        (Analyzing, Event::DetectionSucceeded { request, result }) if model.pending_request == Some(request) => (
            Model {
                state: Results,
                detection_result: Some(result),
                pending_request: None,
                ..model
            },
            vec![],
        ),

        (Analyzing, Event::DetectionFailed { request, message }) if model.pending_request == Some(request) => (
            Model {
                state: Error,
                error: Some(message),
                pending_request: None,
                ..model
            },
            vec![],
        ),

        // 解析中に離脱した場合は実行中の検出を取り消す
        (Analyzing, Event::StartOver) => {
            let effects = model
                .pending_request
                .map(|request| vec![Effect::CancelDetection { request }])
                .unwrap_or_default();
            (model.reset(), effects)
        }

        (Results, Event::TakeAnother) => (
            Model {
                state: Capturing,
                captured_image: None,
                detection_result: None,
                ..model
            },
            vec![Effect::AcquireCamera],
        ),

        (Results, Event::StartOver) => (model.reset(), vec![]),

        (Error, Event::Retry) => (model.reset(), vec![]),

        (_, _) => (model, vec![]),
    }
}
