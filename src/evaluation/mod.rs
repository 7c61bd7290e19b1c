//! 交差検証と分類メトリクス。
pub mod cross_validation;
pub mod metrics;
pub mod report;

pub use cross_validation::{
    DEFAULT_FOLDS, FoldSplit, StratifiedKFold, Validator, cross_validate, select_rows,
};
pub use metrics::{FoldScore, MetricsCalculator, precision_recall_fscore_support};
pub use report::{CrossValidationSummary, render_json, render_text};
