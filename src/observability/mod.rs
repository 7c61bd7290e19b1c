//! ログ出力の初期化。
pub mod tracing;

pub use self::tracing::init;
