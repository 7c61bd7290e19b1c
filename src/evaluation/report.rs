//! 交差検証結果の集計と出力。
use anyhow::{Context, Result};
use serde::Serialize;

use super::metrics::FoldScore;

/// 全フォールドの平均。
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CrossValidationSummary {
    pub folds: usize,
    pub mean_macro_precision: f64,
    pub mean_macro_recall: f64,
    pub mean_macro_f_score: f64,
    pub mean_weighted_f_score: f64,
}

impl CrossValidationSummary {
    #[must_use]
    pub fn from_scores(scores: &[FoldScore]) -> Self {
        if scores.is_empty() {
            return Self::default();
        }
        let n = scores.len() as f64;
        let average = |metric: fn(&FoldScore) -> f64| scores.iter().map(metric).sum::<f64>() / n;
        Self {
            folds: scores.len(),
            mean_macro_precision: average(FoldScore::macro_precision),
            mean_macro_recall: average(FoldScore::macro_recall),
            mean_macro_f_score: average(FoldScore::macro_f_score),
            mean_weighted_f_score: average(FoldScore::weighted_f_score),
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    folds: &'a [FoldScore],
    summary: CrossValidationSummary,
}

/// 1行1クラスのテキスト形式で出力する。
#[must_use]
pub fn render_text(scores: &[FoldScore]) -> String {
    let mut lines = Vec::new();
    for (fold, score) in scores.iter().enumerate() {
        for (idx, label) in score.labels.iter().enumerate() {
            lines.push(format!(
                "fold {}: class {:>2} precision={:.4} recall={:.4} f_score={:.4} support={}",
                fold + 1,
                label,
                score.precision[idx],
                score.recall[idx],
                score.f_score[idx],
                score.support[idx],
            ));
        }
    }
    let summary = CrossValidationSummary::from_scores(scores);
    lines.push(format!(
        "mean over {} folds: macro_precision={:.4} macro_recall={:.4} macro_f_score={:.4} weighted_f_score={:.4}",
        summary.folds,
        summary.mean_macro_precision,
        summary.mean_macro_recall,
        summary.mean_macro_f_score,
        summary.mean_weighted_f_score,
    ));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// フォールド別スコアとサマリーを1つのJSONドキュメントにする。
///
/// # Errors
/// シリアライズに失敗した場合。
pub fn render_json(scores: &[FoldScore]) -> Result<String> {
    let report = JsonReport {
        folds: scores,
        summary: CrossValidationSummary::from_scores(scores),
    };
    serde_json::to_string_pretty(&report).context("failed to serialize cross-validation report")
}
