//! 開発用の tracing 設定
//!
//! `RUST_LOG` で制御し、stderr に出す。標準出力は結果表示専用。

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// tracing subscriber を初期化する
///
/// `RUST_LOG` が未設定なら `warn`。
///
/// ```bash
/// RUST_LOG=meridian_core=debug meridian --country US
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
