//! ラベル変換・ベクトル化・学習・交差検証をつなぐ。
use sprs::CsMat;

use crate::classification::{LinearSvc, TfidfVectorizer, Vectorizer, map_labels, unrecognized_labels};
use crate::config::{LabelPolicy, TrainerConfig};
use crate::error::{Result, TrainerError};
use crate::evaluation::{FoldScore, StratifiedKFold, cross_validate, precision_recall_fscore_support};

/// ラベル列をスコア列に、本文列をTF-IDF行列に変換する。
///
/// # Errors
/// 本文から語彙が作れない場合は [`TrainerError::EmptyVocabulary`]。
pub fn vectorize<L, T>(classification: &[L], tweets: &[T]) -> Result<(Vec<i32>, CsMat<f64>)>
where
    L: AsRef<str>,
    T: AsRef<str>,
{
    let classification_vector = map_labels(classification);
    let mut vectorizer = TfidfVectorizer::new();
    let feature_vector = vectorizer.fit_transform(tweets)?;
    Ok((classification_vector, feature_vector))
}

/// 対応表にないラベルを方針に従って扱う。
///
/// # Errors
/// [`LabelPolicy::Reject`] で未知ラベルがある場合は [`TrainerError::UnknownLabel`]。
pub fn check_labels<L: AsRef<str>>(classification: &[L], policy: LabelPolicy) -> Result<()> {
    let unknown = unrecognized_labels(classification);
    let Some((row, label)) = unknown.first() else {
        return Ok(());
    };
    match policy {
        LabelPolicy::Neutral => {
            tracing::warn!(
                count = unknown.len(),
                first_row = row,
                first_label = %label,
                "unrecognized sentiment labels are scored as neutral"
            );
            Ok(())
        }
        LabelPolicy::Reject => Err(TrainerError::UnknownLabel {
            row: *row,
            label: label.clone(),
        }),
    }
}

/// 既定設定（C=1000、tol=1e-3、L1正則化、10分割）で学習・検証する。
///
/// # Errors
/// [`train_and_validate_with`] と同じ。
pub fn train_and_validate<L, T>(classification: &[L], tweets: &[T]) -> Result<Vec<FoldScore>>
where
    L: AsRef<str>,
    T: AsRef<str>,
{
    train_and_validate_with(classification, tweets, &TrainerConfig::default())
}

/// 線形SVCを層化K分割交差検証し、フォールドごとのスコアを返す。
///
/// # Errors
/// 行数の不一致、語彙が空、サンプル数不足、学習データが1クラスのみの場合。
pub fn train_and_validate_with<L, T>(
    classification: &[L],
    tweets: &[T],
    config: &TrainerConfig,
) -> Result<Vec<FoldScore>>
where
    L: AsRef<str>,
    T: AsRef<str>,
{
    if classification.len() != tweets.len() {
        return Err(TrainerError::DimensionMismatch(format!(
            "{} labels but {} texts",
            classification.len(),
            tweets.len()
        )));
    }

    let (classification_vector, feature_vector) = vectorize(classification, tweets)?;
    let classifier = LinearSvc::new(config.svc_params());
    let validator = StratifiedKFold::new(config.cv_folds());

    tracing::info!(
        samples = feature_vector.rows(),
        features = feature_vector.cols(),
        folds = config.cv_folds(),
        "starting cross-validation"
    );

    cross_validate(
        &classifier,
        &feature_vector,
        &classification_vector,
        &validator,
        precision_recall_fscore_support,
    )
}
