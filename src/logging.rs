//! tracing 初期化

use tracing_subscriber::EnvFilter;

/// RUST_LOG が設定されていればそれを優先する
pub fn init(verbose: bool) {
    let default_filter = if verbose {
        "snap_learn=debug,tower_http=debug"
    } else {
        "snap_learn=info,tower_http=warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // 二重初期化（テスト等）は無視
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
