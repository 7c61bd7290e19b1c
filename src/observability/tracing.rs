use anyhow::{Error, Result};
use once_cell::sync::OnceCell;
use tracing::debug;
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::OutputFormat;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// Tracing サブスクライバを一度だけ初期化する。
///
/// ログは標準エラー出力へ書き出す（標準出力はスコアのレポート専用）。
/// `RUST_LOG` が未設定なら `info` レベル。`format` が [`OutputFormat::Json`]
/// の場合は1行1JSONで出力する。
///
/// # Errors
/// 既に別のグローバルサブスクライバが設定されている場合はエラーを返す。
pub fn init(format: OutputFormat) -> Result<()> {
    TRACING_INIT.get_or_try_init(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match format {
            OutputFormat::Json => tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .json()
                .boxed(),
            OutputFormat::Text => tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .boxed(),
        };

        tracing_subscriber::registry()
            .with(fmt_layer)
            .with(env_filter)
            .try_init()
            .map_err(|e: tracing_subscriber::util::TryInitError| Error::msg(e.to_string()))?;
        debug!(format = ?format, "tracing initialized");

        Ok::<(), Error>(())
    })?;
    Ok(())
}
