//! 副作用の実行（executor）
//!
//! `transition` が返した Effect をカメラ・検出器に対して実行し、
//! 結果をイベントとして状態機械に戻す。

use super::{transition, AppState, Effect, Event, Model, RequestId};
use crate::capture::{CameraDevice, CaptureAdapter};
use crate::client::Detector;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

pub struct App<D: CameraDevice> {
    model: Model,
    camera: CaptureAdapter<D>,
    detector: Arc<dyn Detector>,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
    /// 実行中の検出タスク（同時に1つまで）
    inflight: Option<(RequestId, AbortHandle)>,
}

impl<D: CameraDevice> App<D> {
    pub fn new(camera: CaptureAdapter<D>, detector: Arc<dyn Detector>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            model: Model::default(),
            camera,
            detector,
            events_tx,
            events_rx,
            inflight: None,
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn state(&self) -> AppState {
        self.model.state
    }

    pub fn camera(&self) -> &CaptureAdapter<D> {
        &self.camera
    }

    /// イベントを反映し、副作用とその結果のイベントを順に処理する
    pub async fn dispatch(&mut self, event: Event) {
        let mut queue = VecDeque::from([event]);

        while let Some(event) = queue.pop_front() {
            let from = self.model.state;
            let (model, effects) = transition(std::mem::take(&mut self.model), event);
            self.model = model;

            if from != self.model.state {
                debug!(from = ?from, to = ?self.model.state, "state changed");
            }

            for effect in effects {
                if let Some(follow_up) = self.perform(effect).await {
                    queue.push_back(follow_up);
                }
            }
        }
    }

    /// 実行中の検出が終わるまで待って結果を反映する
    ///
    /// 検出が実行中でなければ何もせず false を返す。
    pub async fn settle(&mut self) -> bool {
        let mut handled = false;

        while self.model.is_busy() {
            let Some(event) = self.events_rx.recv().await else {
                break;
            };

            if let Event::DetectionSucceeded { request, .. } | Event::DetectionFailed { request, .. } = &event {
                if matches!(self.inflight, Some((id, _)) if id == *request) {
                    self.inflight = None;
                }
            }

            self.dispatch(event).await;
            handled = true;
        }

        handled
    }

    async fn perform(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::AcquireCamera => self
                .camera
                .acquire()
                .await
                .err()
                .map(|e| Event::CameraFailed(e.to_string())),

            Effect::ReleaseCamera => {
                self.camera.release();
                self.camera.discard();
                None
            }

            Effect::CaptureFrame => match self.camera.capture_frame() {
                Ok(image) => Some(Event::ImageCaptured(image)),
                Err(e) => Some(Event::CameraFailed(e.to_string())),
            },

            Effect::ResumePreview => self
                .camera
                .retake()
                .await
                .err()
                .map(|e| Event::CameraFailed(e.to_string())),

            Effect::StartDetection { request, image } => {
                if let Some((old, handle)) = self.inflight.take() {
                    warn!(request = old, "aborting stale detection");
                    handle.abort();
                }

                let detector = Arc::clone(&self.detector);
                let tx = self.events_tx.clone();
                let task = tokio::spawn(async move {
                    let event = match detector.detect(&image).await {
                        Ok(result) => Event::DetectionSucceeded { request, result },
                        Err(e) => Event::DetectionFailed {
                            request,
                            message: e.to_string(),
                        },
                    };
                    // 受信側が無い（アプリ終了済み）場合は捨てる
                    let _ = tx.send(event);
                });

                info!(request, "detection started");
                self.inflight = Some((request, task.abort_handle()));
                None
            }

            Effect::CancelDetection { request } => {
                match self.inflight.take() {
                    Some((id, handle)) if id == request => {
                        handle.abort();
                        info!(request, "detection cancelled");
                    }
                    other => self.inflight = other,
                }
                None
            }
        }
    }
}
