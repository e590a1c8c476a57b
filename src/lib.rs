//! Snap & Learn
//!
//! カメラで撮影 → 縮小・JPEG化 → 検出関数へ送信 → 結果表示。
//! 検出関数（Gemini 連携サーバ）も同じクレートで提供する。

pub mod capture;
pub mod cli;
pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod server;
pub mod session;
