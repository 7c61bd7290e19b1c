//! 感情ラベルを数値スコアへ変換する。

/// ラベル文字列（小文字）とスコアの固定対応表。
pub const SENTIMENT_MAP: [(&str, i32); 4] = [
    ("positive", 1),
    ("negative", -1),
    ("neutral", 0),
    ("irrelevant", 0),
];

/// 対応表にないラベルに与えるスコア。
pub const UNKNOWN_SCORE: i32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
    Irrelevant,
    Unknown,
}

impl SentimentLabel {
    /// 大文字小文字を区別せずにラベルを解釈する。前後の空白は除去しない。
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "positive" => Self::Positive,
            "negative" => Self::Negative,
            "neutral" => Self::Neutral,
            "irrelevant" => Self::Irrelevant,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn score(self) -> i32 {
        match self {
            Self::Positive => 1,
            Self::Negative => -1,
            Self::Neutral | Self::Irrelevant | Self::Unknown => UNKNOWN_SCORE,
        }
    }

    #[must_use]
    pub fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// 単一ラベルのスコアを引く。失敗しない。
#[must_use]
pub fn sentiment_score(raw: &str) -> i32 {
    let lowered = raw.to_lowercase();
    SENTIMENT_MAP
        .iter()
        .find(|(label, _)| *label == lowered)
        .map_or(UNKNOWN_SCORE, |(_, score)| *score)
}

/// ラベル列を同じ長さ・同じ順序のスコア列へ変換する。
#[must_use]
pub fn map_labels<S: AsRef<str>>(labels: &[S]) -> Vec<i32> {
    labels
        .iter()
        .map(|label| sentiment_score(label.as_ref()))
        .collect()
}

/// 対応表にないラベルの位置と原文を返す。
#[must_use]
pub fn unrecognized_labels<S: AsRef<str>>(labels: &[S]) -> Vec<(usize, String)> {
    labels
        .iter()
        .enumerate()
        .filter(|(_, label)| !SentimentLabel::parse(label.as_ref()).is_known())
        .map(|(idx, label)| (idx, label.as_ref().to_string()))
        .collect()
}
