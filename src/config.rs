use std::{env, str::FromStr};

use thiserror::Error;

use crate::classification::{Penalty, SvcParams};
use crate::evaluation::DEFAULT_FOLDS;

/// 対応表にないラベルの扱い。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelPolicy {
    /// 中立（0）として学習に使う。
    Neutral,
    /// 最初の未知ラベルでエラーにする。
    Reject,
}

impl FromStr for LabelPolicy {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_lowercase().as_str() {
            "neutral" => Ok(Self::Neutral),
            "reject" => Ok(Self::Reject),
            other => Err(anyhow::anyhow!("expected neutral or reject, got {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(anyhow::anyhow!("expected text or json, got {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainerConfig {
    cv_folds: usize,
    svc_c: f64,
    svc_tol: f64,
    svc_max_iter: usize,
    label_policy: LabelPolicy,
    report_format: OutputFormat,
    log_format: OutputFormat,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {source}")]
    Invalid {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl Default for TrainerConfig {
    fn default() -> Self {
        let svc = SvcParams::default();
        Self {
            cv_folds: DEFAULT_FOLDS,
            svc_c: svc.c,
            svc_tol: svc.tol,
            svc_max_iter: svc.max_iter,
            label_policy: LabelPolicy::Neutral,
            report_format: OutputFormat::Text,
            log_format: OutputFormat::Text,
        }
    }
}

impl TrainerConfig {
    /// 環境変数から学習設定を読み込み、検証する。未設定の項目は既定値を使う。
    ///
    /// # Errors
    /// 値のパースに失敗した場合、または範囲外の場合は [`ConfigError`] を返す。
    pub fn from_env() -> Result<Self, ConfigError> {
        let cv_folds = parse_usize("SENTIMENT_CV_FOLDS", DEFAULT_FOLDS)?;
        if cv_folds < 2 {
            return Err(ConfigError::Invalid {
                name: "SENTIMENT_CV_FOLDS",
                source: anyhow::anyhow!("must be at least 2"),
            });
        }
        let defaults = SvcParams::default();
        let svc_c = parse_positive_f64("SENTIMENT_SVC_C", defaults.c)?;
        let svc_tol = parse_positive_f64("SENTIMENT_SVC_TOL", defaults.tol)?;
        let svc_max_iter = parse_usize("SENTIMENT_SVC_MAX_ITER", defaults.max_iter)?;
        if svc_max_iter == 0 {
            return Err(ConfigError::Invalid {
                name: "SENTIMENT_SVC_MAX_ITER",
                source: anyhow::anyhow!("must be greater than zero"),
            });
        }
        let label_policy = parse_enum("SENTIMENT_UNKNOWN_LABELS", LabelPolicy::Neutral)?;
        let report_format = parse_enum("SENTIMENT_REPORT_FORMAT", OutputFormat::Text)?;
        let log_format = parse_enum("SENTIMENT_LOG_FORMAT", OutputFormat::Text)?;

        Ok(Self {
            cv_folds,
            svc_c,
            svc_tol,
            svc_max_iter,
            label_policy,
            report_format,
            log_format,
        })
    }

    #[must_use]
    pub fn cv_folds(&self) -> usize {
        self.cv_folds
    }

    #[must_use]
    pub fn label_policy(&self) -> LabelPolicy {
        self.label_policy
    }

    #[must_use]
    pub fn report_format(&self) -> OutputFormat {
        self.report_format
    }

    #[must_use]
    pub fn log_format(&self) -> OutputFormat {
        self.log_format
    }

    /// L1正則化・二乗ヒンジ損失の線形SVC設定。
    #[must_use]
    pub fn svc_params(&self) -> SvcParams {
        SvcParams {
            penalty: Penalty::L1,
            c: self.svc_c,
            tol: self.svc_tol,
            max_iter: self.svc_max_iter,
            ..SvcParams::default()
        }
    }

    #[must_use]
    pub fn with_cv_folds(mut self, cv_folds: usize) -> Self {
        self.cv_folds = cv_folds;
        self
    }

    #[must_use]
    pub fn with_label_policy(mut self, label_policy: LabelPolicy) -> Self {
        self.label_policy = label_policy;
        self
    }

    #[must_use]
    pub fn with_report_format(mut self, report_format: OutputFormat) -> Self {
        self.report_format = report_format;
        self
    }
}

fn parse_usize(name: &'static str, default: usize) -> Result<usize, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<usize>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_positive_f64(name: &'static str, default: f64) -> Result<f64, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    let parsed = raw.parse::<f64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })?;
    if parsed.is_finite() && parsed > 0.0 {
        Ok(parsed)
    } else {
        Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("must be a positive number, got {raw}"),
        })
    }
}

fn parse_enum<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr<Err = anyhow::Error>,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|source| ConfigError::Invalid { name, source }),
        Err(_) => Ok(default),
    }
}
