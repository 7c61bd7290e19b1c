//! ツイート本文の正規化とトークナイズ。
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// 2文字以上の単語文字の連なりをトークンとみなす。
pub const DEFAULT_TOKEN_PATTERN: &str = r"\b\w\w+\b";

fn normalize_text(input: &str) -> String {
    input.nfc().collect::<String>().to_lowercase()
}

#[derive(Debug, Clone)]
pub struct WordTokenizer {
    token_re: Regex,
}

impl WordTokenizer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            token_re: Regex::new(DEFAULT_TOKEN_PATTERN).expect("compile token pattern"),
        }
    }

    /// 任意のパターンでトークナイザを作る。
    ///
    /// # Errors
    /// パターンが正規表現として不正な場合。
    pub fn with_pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            token_re: Regex::new(pattern)?,
        })
    }

    #[must_use]
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let normalized = normalize_text(text);
        self.token_re
            .find_iter(&normalized)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

impl Default for WordTokenizer {
    fn default() -> Self {
        Self::new()
    }
}
