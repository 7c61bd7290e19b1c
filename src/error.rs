/// 学習パイプラインのエラー分類。
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrainerError {
    /// 語彙が空（入力が空、または2文字以上のトークンが一つもない）。
    #[error("empty vocabulary: the documents contain no tokens of two or more word characters")]
    EmptyVocabulary,
    #[error("{0} has not been fitted")]
    NotFitted(&'static str),
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
    /// 学習データに1クラスしか存在しない。
    #[error("the training data needs at least two classes, got {0:?}")]
    SingleClass(Vec<i32>),
    #[error("number of folds must be at least 2, got {0}")]
    InvalidFolds(usize),
    #[error("cannot split {samples} samples into {folds} folds")]
    InsufficientSamples { samples: usize, folds: usize },
    /// 層化分割で各クラスが全フォールドに行き渡らない。
    #[error("class {label} has {members} members, fewer than the {folds} folds requested")]
    InsufficientClassMembers {
        label: i32,
        members: usize,
        folds: usize,
    },
    #[error("malformed corpus: {0}")]
    CorpusFormat(String),
    #[error("unknown sentiment label {label:?} at row {row}")]
    UnknownLabel { row: usize, label: String },
}

pub type Result<T> = std::result::Result<T, TrainerError>;
