use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

use sentiment_trainer::{
    TrainerError,
    classification::map_labels,
    cli::{BootstrapOutcome, Cli, MISSING_CORPUS_MESSAGE, bootstrap, write_report},
    config::{LabelPolicy, OutputFormat, TrainerConfig},
    corpus::{CorpusFormat, load_corpus, parse_training_corpus},
    pipeline::vectorize,
};
use tempfile::NamedTempFile;

const POSITIVE_WORDS: [&str; 5] = ["love", "great", "awesome", "happy", "brilliant"];
const NEGATIVE_WORDS: [&str; 5] = ["hate", "awful", "broken", "angry", "terrible"];
const TOPICS: [&str; 4] = ["apple", "google", "microsoft", "twitter"];

/// Sanders形式のヘッダを持つ、2クラス各50件のCSV。
fn balanced_sanders_csv() -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("temp file");
    writeln!(file, "\"Topic\",\"Sentiment\",\"TweetId\",\"TweetDate\",\"TweetText\"")
        .expect("write header");
    for i in 0..50 {
        let topic = TOPICS[i % TOPICS.len()];
        writeln!(
            file,
            "\"{topic}\",\"positive\",\"{}\",\"Tue Oct 18 21:53:25 +0000 2011\",\"I {} my new {topic} gadget #{i}\"",
            1000 + i,
            POSITIVE_WORDS[i % POSITIVE_WORDS.len()],
        )
        .expect("write row");
        writeln!(
            file,
            "\"{topic}\",\"Negative\",\"{}\",\"Tue Oct 18 21:53:25 +0000 2011\",\"so {} with {topic} today #{i}\"",
            2000 + i,
            NEGATIVE_WORDS[i % NEGATIVE_WORDS.len()],
        )
        .expect("write row");
    }
    file.flush().expect("flush");
    file
}

fn cli_for(path: PathBuf) -> Cli {
    Cli {
        corpus_file: Some(path),
    }
}

#[test]
fn balanced_corpus_yields_ten_fold_scores() {
    let file = balanced_sanders_csv();
    let mut out = Vec::new();

    let outcome = bootstrap(
        &cli_for(file.path().to_path_buf()),
        &TrainerConfig::default(),
        &mut out,
    )
    .expect("training should succeed");

    let BootstrapOutcome::Trained(scores) = outcome else {
        panic!("expected trained outcome");
    };
    assert_eq!(scores.len(), 10);
    for score in &scores {
        assert_eq!(score.labels, vec![-1, 1]);
        assert_eq!(score.precision.len(), 2);
        assert_eq!(score.recall.len(), 2);
        assert_eq!(score.f_score.len(), 2);
        assert_eq!(score.support, vec![5, 5]);
        for value in score
            .precision
            .iter()
            .chain(&score.recall)
            .chain(&score.f_score)
        {
            assert!((0.0..=1.0).contains(value));
        }
    }
    assert!(out.is_empty(), "bootstrap writes nothing on success");
}

#[test]
fn configured_folds_flow_into_json_report() {
    let file = balanced_sanders_csv();
    let config = TrainerConfig::default()
        .with_cv_folds(5)
        .with_report_format(OutputFormat::Json);

    let outcome = bootstrap(&cli_for(file.path().to_path_buf()), &config, &mut Vec::new())
        .expect("training should succeed");
    let BootstrapOutcome::Trained(scores) = outcome else {
        panic!("expected trained outcome");
    };
    assert_eq!(scores.len(), 5);
    assert!(scores.iter().all(|score| score.support == vec![10, 10]));

    let mut report = Vec::new();
    write_report(&scores, config.report_format(), &mut report).expect("report");
    let value: serde_json::Value = serde_json::from_slice(&report).expect("json report");
    assert_eq!(value["summary"]["folds"], 5);
}

#[test]
fn missing_corpus_prints_usage_and_returns_no_scores() {
    let mut out = Vec::new();
    let outcome = bootstrap(&Cli::default(), &TrainerConfig::default(), &mut out)
        .expect("missing corpus is not an error");
    assert_eq!(outcome, BootstrapOutcome::MissingCorpus);
    assert_eq!(
        String::from_utf8(out).expect("utf8"),
        format!("{MISSING_CORPUS_MESSAGE}\n")
    );
}

#[test]
fn mixed_case_labels_map_to_scores() {
    let data = "label,text\nPositive,good one\nnegative,bad one\nNeutral,meh one\nirrelevant,lunch one\n";
    let corpus = parse_training_corpus(data.as_bytes(), CorpusFormat::Csv).expect("parse");
    assert_eq!(map_labels(&corpus.labels), vec![1, -1, 0, 0]);

    let (classification, features) = vectorize(&corpus.labels, &corpus.texts).expect("vectorize");
    assert_eq!(classification, vec![1, -1, 0, 0]);
    assert_eq!(features.rows(), 4);
}

#[test]
fn small_corpus_fails_instead_of_truncating_folds() {
    let mut file = tempfile::Builder::new()
        .suffix(".jsonl")
        .tempfile()
        .expect("temp file");
    for (label, text) in [
        ("positive", "great phone"),
        ("negative", "awful phone"),
        ("positive", "love it"),
        ("negative", "hate it"),
    ] {
        writeln!(file, "{{\"label\":\"{label}\",\"text\":\"{text}\"}}").expect("write");
    }
    file.flush().expect("flush");

    let mut out = Vec::new();
    let error = bootstrap(
        &cli_for(file.path().to_path_buf()),
        &TrainerConfig::default(),
        &mut out,
    )
    .expect_err("four samples cannot fill ten folds");
    assert!(matches!(
        error.downcast_ref::<TrainerError>(),
        Some(TrainerError::InsufficientSamples { samples: 4, folds: 10 })
    ));
}

#[test]
fn reject_policy_stops_on_unknown_label() {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("temp file");
    writeln!(file, "sentiment,text\npositive,nice\nspam,buy now\n").expect("write");
    file.flush().expect("flush");

    let config = TrainerConfig::default().with_label_policy(LabelPolicy::Reject);
    let mut out = Vec::new();
    let error = bootstrap(&cli_for(file.path().to_path_buf()), &config, &mut out)
        .expect_err("spam label is rejected");
    assert!(matches!(
        error.downcast_ref::<TrainerError>(),
        Some(TrainerError::UnknownLabel { row: 1, .. })
    ));
}

#[test]
fn load_corpus_reads_sanders_file() {
    let file = balanced_sanders_csv();
    let corpus = load_corpus(file.path()).expect("load");
    assert_eq!(corpus.len(), 100);
    assert_eq!(corpus.labels.len(), corpus.texts.len());
}

#[test]
fn binary_exits_with_status_two_without_corpus() {
    let output = Command::new(env!("CARGO_BIN_EXE_sentiment-trainer"))
        .env_remove("SENTIMENT_CV_FOLDS")
        .env_remove("SENTIMENT_REPORT_FORMAT")
        .output()
        .expect("run binary");
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        format!("{MISSING_CORPUS_MESSAGE}\n")
    );
}

#[test]
fn binary_prints_json_report() {
    let file = balanced_sanders_csv();
    let output = Command::new(env!("CARGO_BIN_EXE_sentiment-trainer"))
        .arg("--corpus-file")
        .arg(file.path())
        .env("SENTIMENT_REPORT_FORMAT", "json")
        .env_remove("SENTIMENT_CV_FOLDS")
        .output()
        .expect("run binary");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json report");
    assert_eq!(report["folds"].as_array().map(Vec::len), Some(10));
    assert_eq!(report["summary"]["folds"], 10);
}
