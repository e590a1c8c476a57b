use crate::capture::FrameBounds;
use crate::error::{Result, SnapError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";

pub const ENV_ENDPOINT: &str = "SNAP_LEARN_ENDPOINT";
pub const ENV_API_TOKEN: &str = "SNAP_LEARN_API_TOKEN";
pub const ENV_GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
pub const ENV_BIND: &str = "SNAP_LEARN_BIND";
pub const ENV_GEMINI_URL: &str = "SNAP_LEARN_GEMINI_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 検出関数のURL（クライアント側）
    pub endpoint: Option<String>,
    /// 検出関数に送るBearerトークン
    pub api_token: Option<String>,
    /// Gemini APIキー（サーバ側）
    pub google_api_key: Option<String>,
    pub gemini_api_url: String,
    pub bind_address: String,
    pub max_image_width: u32,
    pub max_image_height: u32,
    /// JPEG品質 (1-100)
    pub jpeg_quality: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_token: None,
            google_api_key: None,
            gemini_api_url: DEFAULT_GEMINI_API_URL.into(),
            bind_address: "127.0.0.1:8787".into(),
            max_image_width: 800,
            max_image_height: 600,
            jpeg_quality: 80,
        }
    }
}

impl Config {
    /// 設定ファイル → 環境変数の順に読み込む
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// 指定パスから読み込み（存在しなければデフォルト）
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| SnapError::Config("home directory not found".into()))?;
        Ok(home.join(".config").join("snap-learn").join("config.json"))
    }

    /// 環境変数で上書き（空文字は無視）
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_ENDPOINT) {
            self.endpoint = Some(v);
        }
        if let Some(v) = get(ENV_API_TOKEN) {
            self.api_token = Some(v);
        }
        if let Some(v) = get(ENV_GOOGLE_API_KEY) {
            self.google_api_key = Some(v);
        }
        if let Some(v) = get(ENV_BIND) {
            self.bind_address = v;
        }
        if let Some(v) = get(ENV_GEMINI_URL) {
            self.gemini_api_url = v;
        }
    }

    pub fn endpoint(&self) -> Result<&str> {
        self.endpoint.as_deref().ok_or(SnapError::MissingEndpoint)
    }

    pub fn frame_bounds(&self) -> FrameBounds {
        FrameBounds {
            max_width: self.max_image_width,
            max_height: self.max_image_height,
            jpeg_quality: self.jpeg_quality.clamp(1, 100),
        }
    }

    /// 設定ファイルの内容だけを読み直して編集・保存する
    ///
    /// 環境変数由来の値はファイルに書き込まない。
    pub fn update_file(path: &Path, edit: impl FnOnce(&mut Config)) -> Result<Config> {
        let mut on_disk = Self::load_from(path)?;
        edit(&mut on_disk);
        on_disk.save_to(path)?;
        Ok(on_disk)
    }

    /// Bearerトークンを保存し、現在の設定にも反映
    pub fn set_api_token(&mut self, token: String) -> Result<()> {
        Self::update_file(&Self::config_path()?, |c| c.api_token = Some(token.clone()))?;
        self.api_token = Some(token);
        Ok(())
    }

    /// 検出関数のURLを保存し、現在の設定にも反映
    pub fn set_endpoint(&mut self, endpoint: String) -> Result<()> {
        Self::update_file(&Self::config_path()?, |c| c.endpoint = Some(endpoint.clone()))?;
        self.endpoint = Some(endpoint);
        Ok(())
    }
}

/// 表示用に秘密情報を伏せる
pub fn mask_secret(secret: Option<&str>) -> String {
    match secret {
        Some(s) if s.chars().count() > 8 => {
            let head: String = s.chars().take(4).collect();
            format!("{}…", head)
        }
        Some(_) => "set".into(),
        None => "not set".into(),
    }
}
