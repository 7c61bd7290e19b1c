//! 主問題を座標降下法で解く線形SVC（二乗ヒンジ損失）。
use ndarray::{Array1, Array2};
use sprs::CsMat;

use crate::error::{Result, TrainerError};

/// Armijo条件の係数。
const SIGMA: f64 = 0.01;
const MAX_LINE_SEARCH: usize = 20;
const MIN_CURVATURE: f64 = 1e-12;

/// 行列とラベルから学習し、予測する分類器。
pub trait Classifier: Clone {
    /// # Errors
    /// 行数の不一致やクラス数不足の場合。
    fn fit(&mut self, x: &CsMat<f64>, y: &[i32]) -> Result<()>;

    /// # Errors
    /// 未学習、または特徴次元が学習時と異なる場合。
    fn predict(&self, x: &CsMat<f64>) -> Result<Vec<i32>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Penalty {
    L1,
    L2,
}

/// 線形SVCのハイパーパラメータ。損失は常に二乗ヒンジ（L2 loss）、主問題で解く。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvcParams {
    pub penalty: Penalty,
    pub c: f64,
    pub tol: f64,
    pub max_iter: usize,
    pub fit_intercept: bool,
    pub intercept_scaling: f64,
}

impl Default for SvcParams {
    fn default() -> Self {
        Self {
            penalty: Penalty::L1,
            c: 1000.0,
            tol: 1e-3,
            max_iter: 1000,
            fit_intercept: true,
            intercept_scaling: 1.0,
        }
    }
}

/// 二値問題一つ分の解。
#[derive(Debug, Clone)]
struct BinaryModel {
    coef: Array1<f64>,
    intercept: f64,
    iterations: usize,
    converged: bool,
}

#[derive(Debug, Clone)]
pub struct LinearSvc {
    params: SvcParams,
    classes: Vec<i32>,
    models: Vec<BinaryModel>,
    n_features: usize,
}

impl LinearSvc {
    #[must_use]
    pub fn new(params: SvcParams) -> Self {
        Self {
            params,
            classes: Vec::new(),
            models: Vec::new(),
            n_features: 0,
        }
    }

    /// 学習時に観測したクラス（昇順）。
    #[must_use]
    pub fn classes(&self) -> &[i32] {
        &self.classes
    }

    /// 非ゼロ重みの数（切片を除く）。L1正則化の疎性確認用。
    #[must_use]
    pub fn nonzero_weights(&self) -> usize {
        self.models
            .iter()
            .map(|model| model.coef.iter().filter(|w| **w != 0.0).count())
            .sum()
    }

    /// 各行・各二値モデルの決定値。2クラスの場合は列が1本になる。
    ///
    /// # Errors
    /// 未学習、または特徴次元が学習時と異なる場合。
    pub fn decision_function(&self, x: &CsMat<f64>) -> Result<Array2<f64>> {
        if self.models.is_empty() {
            return Err(TrainerError::NotFitted("classifier"));
        }
        if x.cols() != self.n_features {
            return Err(TrainerError::DimensionMismatch(format!(
                "expected {} features, got {}",
                self.n_features,
                x.cols()
            )));
        }

        let csr = x.to_csr();
        let mut scores = Array2::<f64>::zeros((csr.rows(), self.models.len()));
        for (row, vector) in csr.outer_iterator().enumerate() {
            for (slot, model) in self.models.iter().enumerate() {
                let dot: f64 = vector
                    .iter()
                    .map(|(column, value)| model.coef[column] * value)
                    .sum();
                scores[[row, slot]] = dot + model.intercept;
            }
        }
        Ok(scores)
    }
}

impl Default for LinearSvc {
    fn default() -> Self {
        Self::new(SvcParams::default())
    }
}

impl Classifier for LinearSvc {
    fn fit(&mut self, x: &CsMat<f64>, y: &[i32]) -> Result<()> {
        if x.rows() != y.len() {
            return Err(TrainerError::DimensionMismatch(format!(
                "{} feature rows but {} labels",
                x.rows(),
                y.len()
            )));
        }

        let mut classes = y.to_vec();
        classes.sort_unstable();
        classes.dedup();
        if classes.len() < 2 {
            return Err(TrainerError::SingleClass(classes));
        }

        let columns = column_major(x, self.params);

        // 2クラスなら大きい方のラベルを正例とする1モデル、それ以外はOne-vs-Rest
        let positives: Vec<i32> = if classes.len() == 2 {
            vec![classes[1]]
        } else {
            classes.clone()
        };

        let mut models = Vec::with_capacity(positives.len());
        for positive in positives {
            let signs: Vec<f64> = y
                .iter()
                .map(|label| if *label == positive { 1.0 } else { -1.0 })
                .collect();
            let model = solve_binary(&columns, &signs, x.cols(), self.params);
            if model.converged {
                tracing::debug!(
                    positive_class = positive,
                    iterations = model.iterations,
                    "linear svc converged"
                );
            } else {
                tracing::warn!(
                    positive_class = positive,
                    max_iter = self.params.max_iter,
                    "linear svc did not converge; consider raising the iteration limit"
                );
            }
            models.push(model);
        }

        self.classes = classes;
        self.models = models;
        self.n_features = x.cols();
        Ok(())
    }

    fn predict(&self, x: &CsMat<f64>) -> Result<Vec<i32>> {
        let scores = self.decision_function(x)?;
        let predictions = scores
            .outer_iter()
            .map(|row| {
                if self.classes.len() == 2 {
                    if row[0] > 0.0 {
                        self.classes[1]
                    } else {
                        self.classes[0]
                    }
                } else {
                    let mut best = 0;
                    for (idx, value) in row.iter().enumerate() {
                        if *value > row[best] {
                            best = idx;
                        }
                    }
                    self.classes[best]
                }
            })
            .collect();
        Ok(predictions)
    }
}

/// 列ごとの非ゼロ要素 `(行, 値)`。切片を使う場合は定数列を末尾に足す。
fn column_major(x: &CsMat<f64>, params: SvcParams) -> Vec<Vec<(usize, f64)>> {
    let csc = x.to_csc();
    let mut columns: Vec<Vec<(usize, f64)>> = csc
        .outer_iterator()
        .map(|column| column.iter().map(|(row, value)| (row, *value)).collect())
        .collect();
    if params.fit_intercept {
        columns.push(
            (0..x.rows())
                .map(|row| (row, params.intercept_scaling))
                .collect(),
        );
    }
    columns
}

/// `y` は ±1。目的関数は `R(w) + C * Σ max(0, 1 - y_i w·x_i)^2`、
/// `R` はL1なら `||w||_1`、L2なら `||w||^2 / 2`。
fn solve_binary(
    columns: &[Vec<(usize, f64)>],
    y: &[f64],
    n_features: usize,
    params: SvcParams,
) -> BinaryModel {
    let c = params.c;
    let mut w = Array1::<f64>::zeros(columns.len());
    // margin[i] = 1 - y_i w·x_i
    let mut margin = vec![1.0; y.len()];
    let mut initial_violation: Option<f64> = None;
    let mut iterations = 0;
    let mut converged = false;

    while iterations < params.max_iter {
        iterations += 1;
        let mut violation_sum = 0.0;

        for (j, column) in columns.iter().enumerate() {
            let mut grad = 0.0;
            let mut hess = 0.0;
            for &(i, value) in column {
                if margin[i] > 0.0 {
                    grad -= 2.0 * c * y[i] * value * margin[i];
                    hess += 2.0 * c * value * value;
                }
            }
            let wj = w[j];

            let (direction, violation, expected_decrease) = match params.penalty {
                Penalty::L1 => {
                    hess = hess.max(MIN_CURVATURE);
                    let violation = if wj > 0.0 {
                        (grad + 1.0).abs()
                    } else if wj < 0.0 {
                        (grad - 1.0).abs()
                    } else {
                        (grad - 1.0).max(-1.0 - grad).max(0.0)
                    };
                    let direction = if grad + 1.0 <= hess * wj {
                        -(grad + 1.0) / hess
                    } else if grad - 1.0 >= hess * wj {
                        -(grad - 1.0) / hess
                    } else {
                        -wj
                    };
                    let decrease = grad * direction + (wj + direction).abs() - wj.abs();
                    (direction, violation, decrease)
                }
                Penalty::L2 => {
                    grad += wj;
                    hess += 1.0;
                    let direction = -grad / hess;
                    (direction, grad.abs(), grad * direction)
                }
            };
            violation_sum += violation;

            if direction.abs() < MIN_CURVATURE {
                continue;
            }

            let mut step = 1.0;
            for _ in 0..MAX_LINE_SEARCH {
                let delta = step * direction;
                let mut loss_change = 0.0;
                for &(i, value) in column {
                    let before = margin[i].max(0.0);
                    let after = (margin[i] - delta * y[i] * value).max(0.0);
                    loss_change += c * (after * after - before * before);
                }
                let penalty_change = match params.penalty {
                    Penalty::L1 => (wj + delta).abs() - wj.abs(),
                    Penalty::L2 => 0.5 * ((wj + delta).powi(2) - wj * wj),
                };
                if loss_change + penalty_change <= SIGMA * step * expected_decrease {
                    for &(i, value) in column {
                        margin[i] -= delta * y[i] * value;
                    }
                    w[j] = wj + delta;
                    break;
                }
                step *= 0.5;
            }
        }

        let initial = *initial_violation.get_or_insert(violation_sum);
        if violation_sum <= params.tol * initial {
            converged = true;
            break;
        }
    }

    let (coef, intercept) = if params.fit_intercept {
        let coef = w.slice(ndarray::s![..n_features]).to_owned();
        (coef, w[n_features] * params.intercept_scaling)
    } else {
        (w, 0.0)
    };

    BinaryModel {
        coef,
        intercept,
        iterations,
        converged,
    }
}
