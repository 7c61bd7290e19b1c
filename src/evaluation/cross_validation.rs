//! 層化K分割交差検証。
use std::collections::BTreeMap;

use sprs::CsMat;

use super::metrics::FoldScore;
use crate::classification::Classifier;
use crate::error::{Result, TrainerError};

pub const DEFAULT_FOLDS: usize = 10;

/// 交差検証の1分割。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// ラベル列から学習・検証の分割を作る。
pub trait Validator {
    /// # Errors
    /// 分割数やサンプル数が不正な場合。
    fn split(&self, y: &[i32]) -> Result<Vec<FoldSplit>>;

    fn n_folds(&self) -> usize;
}

/// シャッフルしない層化K分割。
///
/// サンプルをラベルで安定ソートし、その順序で `i, i + k, i + 2k, ...` 番目を
/// フォールド `i` の検証データにする。各クラスがほぼ均等に全フォールドへ配られる。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StratifiedKFold {
    n_folds: usize,
}

impl StratifiedKFold {
    #[must_use]
    pub fn new(n_folds: usize) -> Self {
        Self { n_folds }
    }
}

impl Default for StratifiedKFold {
    fn default() -> Self {
        Self::new(DEFAULT_FOLDS)
    }
}

impl Validator for StratifiedKFold {
    fn split(&self, y: &[i32]) -> Result<Vec<FoldSplit>> {
        let k = self.n_folds;
        if k < 2 {
            return Err(TrainerError::InvalidFolds(k));
        }
        if y.len() < k {
            return Err(TrainerError::InsufficientSamples {
                samples: y.len(),
                folds: k,
            });
        }

        let mut class_counts: BTreeMap<i32, usize> = BTreeMap::new();
        for label in y {
            *class_counts.entry(*label).or_insert(0) += 1;
        }
        if let Some((label, members)) = class_counts.iter().find(|(_, count)| **count < k) {
            return Err(TrainerError::InsufficientClassMembers {
                label: *label,
                members: *members,
                folds: k,
            });
        }

        let mut order: Vec<usize> = (0..y.len()).collect();
        order.sort_by_key(|&idx| y[idx]);

        let mut fold_of = vec![0usize; y.len()];
        for (position, &idx) in order.iter().enumerate() {
            fold_of[idx] = position % k;
        }

        let splits = (0..k)
            .map(|fold| {
                let (test_indices, train_indices): (Vec<usize>, Vec<usize>) =
                    (0..y.len()).partition(|&idx| fold_of[idx] == fold);
                FoldSplit {
                    train_indices,
                    test_indices,
                }
            })
            .collect();
        Ok(splits)
    }

    fn n_folds(&self) -> usize {
        self.n_folds
    }
}

/// 指定した行だけを取り出したCSR行列を作る。
#[must_use]
pub fn select_rows(x: &CsMat<f64>, rows: &[usize]) -> CsMat<f64> {
    let csr = x.to_csr();
    let mut indptr = Vec::with_capacity(rows.len() + 1);
    let mut indices = Vec::new();
    let mut data = Vec::new();
    indptr.push(0);
    for &row in rows {
        if let Some(view) = csr.outer_view(row) {
            for (column, value) in view.iter() {
                indices.push(column);
                data.push(*value);
            }
        }
        indptr.push(indices.len());
    }
    CsMat::new((rows.len(), csr.cols()), indptr, indices, data)
}

/// 分割ごとにモデルの複製を学習させ、検証データの予測を `scorer` で採点する。
///
/// # Errors
/// 行数とラベル数の不一致、分割・学習・採点のいずれかの失敗をそのまま返す。
pub fn cross_validate<C, V, F>(
    model: &C,
    x: &CsMat<f64>,
    y: &[i32],
    validator: &V,
    scorer: F,
) -> Result<Vec<FoldScore>>
where
    C: Classifier,
    V: Validator,
    F: Fn(&[i32], &[i32]) -> Result<FoldScore>,
{
    if x.rows() != y.len() {
        return Err(TrainerError::DimensionMismatch(format!(
            "{} feature rows but {} labels",
            x.rows(),
            y.len()
        )));
    }

    let splits = validator.split(y)?;
    let mut scores = Vec::with_capacity(splits.len());

    for (fold, split) in splits.iter().enumerate() {
        let x_train = select_rows(x, &split.train_indices);
        let y_train: Vec<i32> = split.train_indices.iter().map(|&idx| y[idx]).collect();
        let x_test = select_rows(x, &split.test_indices);
        let y_test: Vec<i32> = split.test_indices.iter().map(|&idx| y[idx]).collect();

        let mut estimator = model.clone();
        estimator.fit(&x_train, &y_train)?;
        let predicted = estimator.predict(&x_test)?;
        let score = scorer(&y_test, &predicted)?;

        tracing::info!(
            fold = fold + 1,
            folds = validator.n_folds(),
            train_size = y_train.len(),
            test_size = y_test.len(),
            macro_f_score = score.macro_f_score(),
            "fold evaluated"
        );
        scores.push(score);
    }

    Ok(scores)
}
