use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{Result, TrainerError};

#[derive(Debug, Default, Clone, Copy)]
struct LabelStats {
    true_positive: f64,
    false_positive: f64,
    false_negative: f64,
    support: usize, // 正解データに含まれるそのラベルの個数
}

impl LabelStats {
    fn precision(self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    fn recall(self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// 1フォール分のクラス別メトリクス。各ベクトルは `labels` と同じ順序。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoldScore {
    pub labels: Vec<i32>,
    pub precision: Vec<f64>,
    pub recall: Vec<f64>,
    pub f_score: Vec<f64>,
    pub support: Vec<usize>,
}

impl FoldScore {
    #[must_use]
    pub fn macro_precision(&self) -> f64 {
        mean(&self.precision)
    }

    #[must_use]
    pub fn macro_recall(&self) -> f64 {
        mean(&self.recall)
    }

    #[must_use]
    pub fn macro_f_score(&self) -> f64 {
        mean(&self.f_score)
    }

    /// サポート数で重み付けしたF値。
    #[must_use]
    pub fn weighted_f_score(&self) -> f64 {
        let total: usize = self.support.iter().sum();
        if total == 0 {
            return 0.0;
        }
        let weighted: f64 = self
            .f_score
            .iter()
            .zip(&self.support)
            .map(|(f, support)| f * *support as f64)
            .sum();
        weighted / total as f64
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// 正解ラベルと予測ラベルを逐次登録して集計する。
#[derive(Debug, Default)]
pub struct MetricsCalculator {
    per_label: BTreeMap<i32, LabelStats>,
    total_samples: usize,
    correct_samples: usize,
}

impl MetricsCalculator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, expected: i32, predicted: i32) {
        self.total_samples += 1;
        self.per_label.entry(expected).or_default().support += 1;

        if expected == predicted {
            self.correct_samples += 1;
            self.per_label.entry(expected).or_default().true_positive += 1.0;
        } else {
            self.per_label.entry(expected).or_default().false_negative += 1.0;
            self.per_label.entry(predicted).or_default().false_positive += 1.0;
        }
    }

    #[must_use]
    pub fn accuracy(&self) -> f64 {
        ratio(self.correct_samples as f64, self.total_samples as f64)
    }

    #[must_use]
    pub fn finalize(&self) -> FoldScore {
        let mut score = FoldScore {
            labels: Vec::with_capacity(self.per_label.len()),
            precision: Vec::with_capacity(self.per_label.len()),
            recall: Vec::with_capacity(self.per_label.len()),
            f_score: Vec::with_capacity(self.per_label.len()),
            support: Vec::with_capacity(self.per_label.len()),
        };

        for (label, stats) in &self.per_label {
            let precision = stats.precision();
            let recall = stats.recall();
            let f_score = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            score.labels.push(*label);
            score.precision.push(precision);
            score.recall.push(recall);
            score.f_score.push(f_score);
            score.support.push(stats.support);
        }

        score
    }
}

/// 正解・予測の両方に現れるラベル（昇順）ごとの適合率・再現率・F値・サポート。
///
/// # Errors
/// 長さが異なる場合は [`TrainerError::DimensionMismatch`]。
pub fn precision_recall_fscore_support(y_true: &[i32], y_pred: &[i32]) -> Result<FoldScore> {
    if y_true.len() != y_pred.len() {
        return Err(TrainerError::DimensionMismatch(format!(
            "{} true labels but {} predictions",
            y_true.len(),
            y_pred.len()
        )));
    }
    let mut calculator = MetricsCalculator::new();
    for (expected, predicted) in y_true.iter().zip(y_pred) {
        calculator.push(*expected, *predicted);
    }
    Ok(calculator.finalize())
}
