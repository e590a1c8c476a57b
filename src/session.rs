//! 端末での対話セッション
//!
//! 状態機械の各状態をテキストで描画し、dialoguer のメニューでイベントを送る。

use crate::capture::{CameraDevice, StreamInfo};
use crate::controller::{App, AppState, Event, Model};
use anyhow::Context;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use indicatif::{ProgressBar, ProgressStyle};
use snap_learn_common::DetectionResult;
use std::time::Duration;

/// 信頼度の区分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn of(confidence: f64) -> Self {
        if confidence >= 80.0 {
            ConfidenceLevel::High
        } else if confidence >= 60.0 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "High confidence",
            ConfidenceLevel::Medium => "Medium confidence",
            ConfidenceLevel::Low => "Low confidence",
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "Excellent match! The AI is very confident about this identification.",
            ConfidenceLevel::Medium => "Good match! The AI has moderate confidence in this identification.",
            ConfidenceLevel::Low => "Uncertain match. Consider taking another photo with better lighting or angle.",
        }
    }
}

/// メニュー項目。event が None なら終了
#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    pub label: &'static str,
    pub event: Option<Event>,
}

impl MenuItem {
    fn send(label: &'static str, event: Event) -> Self {
        Self { label, event: Some(event) }
    }

    fn quit() -> Self {
        Self { label: "Quit", event: None }
    }
}

/// 現在の状態で選べる操作
pub fn menu_for(model: &Model) -> Vec<MenuItem> {
    match model.state {
        AppState::Landing => vec![MenuItem::send("Detect object", Event::Start), MenuItem::quit()],
        AppState::Capturing if model.camera_error.is_some() => vec![
            MenuItem::send("Try again", Event::RetryCamera),
            MenuItem::send("Go back", Event::Back),
        ],
        AppState::Capturing if model.captured_image.is_some() => vec![
            MenuItem::send("Analyze object", Event::Analyze),
            MenuItem::send("Retake", Event::Retake),
            MenuItem::send("Back", Event::Back),
        ],
        AppState::Capturing => vec![
            MenuItem::send("Capture", Event::Shutter),
            MenuItem::send("Back", Event::Back),
        ],
        // 解析中は操作を受け付けない（Ctrl-C で取り消し）
        AppState::Analyzing => vec![],
        AppState::Results => vec![
            MenuItem::send("Take another photo", Event::TakeAnother),
            MenuItem::send("Start over", Event::StartOver),
            MenuItem::quit(),
        ],
        AppState::Error => vec![MenuItem::send("Start over", Event::Retry), MenuItem::quit()],
    }
}

/// 20マスの信頼度バー
fn confidence_bar(confidence: f64) -> String {
    let filled = (confidence.clamp(0.0, 100.0) / 5.0).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(20 - filled))
}

/// 検出結果の表示
pub fn format_result(result: &DetectionResult) -> String {
    let level = ConfidenceLevel::of(result.confidence);
    let mut out = format!(
        "{}\n{} {}% {}\n",
        result.object_name,
        confidence_bar(result.confidence),
        result.confidence_percent(),
        level.label()
    );

    if !result.description.is_empty() {
        out.push_str(&format!("\n{}\n", result.description));
    }

    if !result.additional_info.is_empty() {
        out.push_str("\nAdditional Information\n");
        for info in &result.additional_info {
            out.push_str(&format!("  • {}\n", info));
        }
    }

    out.push_str(&format!("\n{}", level.advice()));
    out
}

/// 状態の描画
pub fn render(model: &Model, stream: Option<&StreamInfo>) -> String {
    match model.state {
        AppState::Landing => "Snap & Learn with AI Vision\nPoint your camera at any object and discover what it is instantly.".to_string(),
        AppState::Capturing => {
            if let Some(err) = &model.camera_error {
                format!("Camera Access Required\n{}", err)
            } else if let Some(image) = &model.captured_image {
                format!(
                    "Review Photo\n{}x{} JPEG, {} KB",
                    image.width,
                    image.height,
                    image.payload_len() * 3 / 4 / 1024
                )
            } else {
                match stream {
                    Some(s) => format!(
                        "Capture Object\nLive preview: {} ({}x{})\nCenter the object in frame.",
                        s.label, s.width, s.height
                    ),
                    None => "Starting camera...".to_string(),
                }
            }
        }
        AppState::Analyzing => "Analyzing Your Image".to_string(),
        AppState::Results => match &model.detection_result {
            Some(result) => format_result(result),
            None => "No result".to_string(),
        },
        AppState::Error => format!(
            "Oops! Something went wrong\n{}",
            model.error.as_deref().unwrap_or("An unexpected error occurred")
        ),
    }
}

/// 対話ループ
pub async fn run_interactive<D: CameraDevice>(app: &mut App<D>) -> anyhow::Result<()> {
    let theme = ColorfulTheme::default();

    loop {
        println!("\n{}\n", render(app.model(), app.camera().stream()));

        if app.state() == AppState::Analyzing {
            wait_for_detection(app).await;
            continue;
        }

        let menu = menu_for(app.model());
        let labels: Vec<&str> = menu.iter().map(|m| m.label).collect();
        let choice = Select::with_theme(&theme)
            .items(&labels)
            .default(0)
            .interact()
            .context("menu selection failed")?;

        match menu[choice].event.clone() {
            Some(event) => app.dispatch(event).await,
            None => break,
        }
    }

    Ok(())
}

async fn wait_for_detection<D: CameraDevice>(app: &mut App<D>) {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("The AI is examining the object... (Ctrl-C to cancel)");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let cancelled = tokio::select! {
        _ = app.settle() => false,
        _ = tokio::signal::ctrl_c() => true,
    };
    spinner.finish_and_clear();

    if cancelled {
        app.dispatch(Event::StartOver).await;
    }
}
