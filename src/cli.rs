use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "snap-learn")]
#[command(about = "Snap & Learn: identify objects in photos with AI vision", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 検出関数サーバを起動（Ctrl-C で停止）
    Serve {
        /// 待ち受けアドレス（例: 0.0.0.0:8787）
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// 画像ファイルを1枚撮影して検出
    Detect {
        /// カメラ代わりの画像ファイル/フォルダ
        #[arg(required = true)]
        source: PathBuf,

        /// 検出関数のURL（設定より優先）
        #[arg(short, long)]
        endpoint: Option<String>,

        /// 結果をJSONで出力
        #[arg(long)]
        json: bool,

        /// 前面カメラを要求
        #[arg(long)]
        front: bool,
    },

    /// 対話モード（撮影 → 解析 → 結果）
    Session {
        /// カメラ代わりの画像ファイル/フォルダ
        #[arg(required = true)]
        source: PathBuf,

        /// 検出関数のURL（設定より優先）
        #[arg(short, long)]
        endpoint: Option<String>,

        /// ネットワークを使わずデモ結果を返す
        #[arg(long)]
        demo: bool,

        /// 前面カメラを要求
        #[arg(long)]
        front: bool,
    },

    /// 設定を表示/編集
    Config {
        /// Bearerトークンを設定
        #[arg(long)]
        set_api_token: Option<String>,

        /// 検出関数のURLを設定
        #[arg(long)]
        set_endpoint: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
