//! コマンドライン引数と学習処理の起動。
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::config::{OutputFormat, TrainerConfig};
use crate::corpus::load_corpus;
use crate::evaluation::{FoldScore, render_json, render_text};
use crate::pipeline::{check_labels, train_and_validate_with};

/// `-c/--corpus-file` が指定されなかったときに標準出力へ出すメッセージ。
pub const MISSING_CORPUS_MESSAGE: &str = "If you are running this as a standalone program supply the corpus file for training data to option -c/--corpus-file. Use -h option for more help on usage.";

/// Trainer arguments.
///
/// Trains a linear SVC on a labeled tweet corpus and prints
/// 10-fold cross-validated precision, recall, F-score and support.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "sentiment-trainer")]
#[command(version)]
#[command(about, long_about = None)]
pub struct Cli {
    /// name of the input corpus file.
    #[arg(short = 'c', long = "corpus-file", value_name = "Corpus")]
    pub corpus_file: Option<PathBuf>,
}

/// 起動処理の終了状態。
#[derive(Debug, Clone, PartialEq)]
pub enum BootstrapOutcome {
    /// コーパス未指定。案内メッセージのみ出力した。
    MissingCorpus,
    Trained(Vec<FoldScore>),
}

/// コーパスを読み込み、学習と交差検証を行う。
///
/// コーパスが指定されていない場合は [`MISSING_CORPUS_MESSAGE`] を `out` に書き、
/// [`BootstrapOutcome::MissingCorpus`] を返す。
///
/// # Errors
/// ファイルのオープン・解析、ラベル検証、学習のいずれかに失敗した場合。
pub fn bootstrap<W: Write>(
    cli: &Cli,
    config: &TrainerConfig,
    out: &mut W,
) -> Result<BootstrapOutcome> {
    let Some(path) = cli.corpus_file.as_deref() else {
        writeln!(out, "{MISSING_CORPUS_MESSAGE}").context("failed to write usage message")?;
        return Ok(BootstrapOutcome::MissingCorpus);
    };

    let corpus = load_corpus(path)?;
    check_labels(&corpus.labels, config.label_policy()).context("corpus labels rejected")?;
    let scores = train_and_validate_with(&corpus.labels, &corpus.texts, config)
        .context("training and cross-validation failed")?;

    Ok(BootstrapOutcome::Trained(scores))
}

/// スコアを設定された形式で書き出す。
///
/// # Errors
/// 書き込みまたはシリアライズに失敗した場合。
pub fn write_report<W: Write>(scores: &[FoldScore], format: OutputFormat, out: &mut W) -> Result<()> {
    let rendered = match format {
        OutputFormat::Text => render_text(scores),
        OutputFormat::Json => {
            let mut json = render_json(scores)?;
            json.push('\n');
            json
        }
    };
    out.write_all(rendered.as_bytes())
        .context("failed to write report")?;
    out.flush().context("failed to flush report")
}
