//! 学習用コーパスの読み込み。
//!
//! CSV/TSVはヘッダ行から感情ラベル列と本文列を探す（Sanders Twitter Sentiment
//! Corpus の `Topic,Sentiment,TweetId,TweetDate,TweetText` 形式を含む）。
//! JSON Linesは1行1オブジェクト。
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::error::{Result, TrainerError};

const LABEL_HEADERS: [&str; 2] = ["sentiment", "label"];
const TEXT_HEADERS: [&str; 3] = ["tweettext", "text", "tweet"];

/// ラベル列と本文列。位置で対応する。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    pub labels: Vec<String>,
    pub texts: Vec<String>,
}

impl Corpus {
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn push(&mut self, label: String, text: String) {
        self.labels.push(label);
        self.texts.push(text);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorpusFormat {
    Csv,
    Tsv,
    JsonLines,
}

impl CorpusFormat {
    /// 拡張子から形式を決める。不明な拡張子はCSV扱い。
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("tsv") => Self::Tsv,
            Some("jsonl" | "ndjson") => Self::JsonLines,
            _ => Self::Csv,
        }
    }
}

#[derive(Debug, Deserialize)]
struct JsonRecord {
    #[serde(alias = "sentiment")]
    label: String,
    #[serde(alias = "tweet", alias = "tweettext")]
    text: String,
}

/// リーダーからラベル列と本文列を取り出す。リーダーは読み終えた時点で破棄される。
///
/// # Errors
/// 必須列がない、行の列数が揃っていない、JSONが不正な場合は
/// [`TrainerError::CorpusFormat`]。
pub fn parse_training_corpus<R: Read>(reader: R, format: CorpusFormat) -> Result<Corpus> {
    match format {
        CorpusFormat::Csv => parse_delimited(reader, b','),
        CorpusFormat::Tsv => parse_delimited(reader, b'\t'),
        CorpusFormat::JsonLines => parse_json_lines(reader),
    }
}

fn find_column(headers: &csv::StringRecord, candidates: &[&str]) -> Option<usize> {
    candidates.iter().find_map(|candidate| {
        headers
            .iter()
            .position(|header| header.trim().eq_ignore_ascii_case(candidate))
    })
}

fn parse_delimited<R: Read>(reader: R, delimiter: u8) -> Result<Corpus> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|error| TrainerError::CorpusFormat(format!("unreadable header row: {error}")))?
        .clone();
    let label_column = find_column(&headers, &LABEL_HEADERS).ok_or_else(|| {
        TrainerError::CorpusFormat(format!(
            "no sentiment column in header {:?}",
            headers.iter().collect::<Vec<_>>()
        ))
    })?;
    let text_column = find_column(&headers, &TEXT_HEADERS).ok_or_else(|| {
        TrainerError::CorpusFormat(format!(
            "no text column in header {:?}",
            headers.iter().collect::<Vec<_>>()
        ))
    })?;

    let mut corpus = Corpus::default();
    for (idx, record) in csv_reader.records().enumerate() {
        // ヘッダが1行目なのでデータ行は2行目から
        let line = idx + 2;
        let record = record
            .map_err(|error| TrainerError::CorpusFormat(format!("row {line}: {error}")))?;
        let label = record.get(label_column).unwrap_or_default();
        let text = record.get(text_column).unwrap_or_default();
        corpus.push(label.to_string(), text.to_string());
    }
    Ok(corpus)
}

fn parse_json_lines<R: Read>(reader: R) -> Result<Corpus> {
    let mut corpus = Corpus::default();
    for (idx, line) in BufReader::new(reader).lines().enumerate() {
        let line = line
            .map_err(|error| TrainerError::CorpusFormat(format!("line {}: {error}", idx + 1)))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: JsonRecord = serde_json::from_str(&line)
            .map_err(|error| TrainerError::CorpusFormat(format!("line {}: {error}", idx + 1)))?;
        corpus.push(record.label, record.text);
    }
    Ok(corpus)
}

/// コーパスファイルを開いて読み込む。ファイルはこの関数を抜ける前に閉じられる。
///
/// # Errors
/// ファイルが開けない、または形式が不正な場合。エラーにはパスが含まれる。
pub fn load_corpus(path: &Path) -> anyhow::Result<Corpus> {
    let format = CorpusFormat::from_path(path);
    let file = File::open(path)
        .with_context(|| format!("failed to open corpus file {}", path.display()))?;
    let corpus = parse_training_corpus(BufReader::new(file), format)
        .with_context(|| format!("failed to parse corpus file {}", path.display()))?;

    tracing::info!(
        path = %path.display(),
        format = ?format,
        entries = corpus.len(),
        "corpus loaded"
    );
    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parses_sanders_style_csv() {
        let data = "\"Topic\",\"Sentiment\",\"TweetId\",\"TweetDate\",\"TweetText\"\n\
                    \"apple\",\"positive\",\"126415614616154112\",\"Tue Oct 18 21:53:25 +0000 2011\",\"Now all @Apple has to do is get swype on the iphone\"\n\
                    \"apple\",\"negative\",\"126404574230740992\",\"Tue Oct 18 21:09:33 +0000 2011\",\"@Apple, that's it, I'm done\"\n";
        let corpus = parse_training_corpus(data.as_bytes(), CorpusFormat::Csv).expect("parse");
        assert_eq!(corpus.labels, vec!["positive", "negative"]);
        assert_eq!(corpus.texts[1], "@Apple, that's it, I'm done");
    }

    #[test]
    fn labels_are_kept_verbatim() {
        let data = "label,text\n\"POSITIVE \",hello there\n";
        let corpus = parse_training_corpus(data.as_bytes(), CorpusFormat::Csv).expect("parse");
        assert_eq!(corpus.labels, vec!["POSITIVE "]);
    }

    #[test]
    fn parses_tsv() {
        let data = "sentiment\ttext\nneutral\tjust a tweet\n";
        let corpus = parse_training_corpus(data.as_bytes(), CorpusFormat::Tsv).expect("parse");
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.texts, vec!["just a tweet"]);
    }

    #[test]
    fn parses_json_lines_and_skips_blank_lines() {
        let data = "{\"label\":\"positive\",\"text\":\"great\"}\n\n{\"sentiment\":\"negative\",\"tweet\":\"awful\"}\n";
        let corpus =
            parse_training_corpus(data.as_bytes(), CorpusFormat::JsonLines).expect("parse");
        assert_eq!(corpus.labels, vec!["positive", "negative"]);
        assert_eq!(corpus.texts, vec!["great", "awful"]);
    }

    #[test]
    fn missing_text_column_is_an_error() {
        let data = "Topic,Sentiment\napple,positive\n";
        let error =
            parse_training_corpus(data.as_bytes(), CorpusFormat::Csv).expect_err("no text");
        assert!(matches!(error, TrainerError::CorpusFormat(message) if message.contains("text")));
    }

    #[test]
    fn ragged_rows_are_an_error() {
        let data = "label,text\npositive,hello\nnegative\n";
        let error = parse_training_corpus(data.as_bytes(), CorpusFormat::Csv).expect_err("ragged");
        assert!(matches!(error, TrainerError::CorpusFormat(message) if message.contains("row 3")));
    }

    #[test]
    fn malformed_json_line_is_an_error() {
        let data = "{\"label\":\"positive\"}\n";
        assert!(matches!(
            parse_training_corpus(data.as_bytes(), CorpusFormat::JsonLines),
            Err(TrainerError::CorpusFormat(_))
        ));
    }

    #[rstest]
    #[case("corpus.csv", CorpusFormat::Csv)]
    #[case("corpus.TSV", CorpusFormat::Tsv)]
    #[case("corpus.jsonl", CorpusFormat::JsonLines)]
    #[case("corpus.ndjson", CorpusFormat::JsonLines)]
    #[case("corpus", CorpusFormat::Csv)]
    fn format_follows_extension(#[case] path: &str, #[case] expected: CorpusFormat) {
        assert_eq!(CorpusFormat::from_path(Path::new(path)), expected);
    }

    #[test]
    fn load_corpus_reports_missing_file() {
        let error = load_corpus(Path::new("/nonexistent/corpus.csv")).expect_err("missing");
        assert!(error.to_string().contains("/nonexistent/corpus.csv"));
    }
}
