//! テキスト列からTF-IDF特徴行列を構築する。
use std::collections::{BTreeMap, HashMap};

use sprs::CsMat;

use super::tokenizer::WordTokenizer;
use crate::error::{Result, TrainerError};

/// テキストを数値特徴行列へ変換するサービス。
pub trait Vectorizer {
    /// 語彙を学習し、同じ文書を行列へ変換する。
    ///
    /// # Errors
    /// 語彙が構築できない場合は [`TrainerError::EmptyVocabulary`]。
    fn fit_transform<S: AsRef<str>>(&mut self, documents: &[S]) -> Result<CsMat<f64>>;

    /// 学習済みの語彙で文書を行列へ変換する。
    ///
    /// # Errors
    /// 未学習の場合は [`TrainerError::NotFitted`]。
    fn transform<S: AsRef<str>>(&self, documents: &[S]) -> Result<CsMat<f64>>;

    fn vocabulary_size(&self) -> usize;
}

/// 語彙順ソート、平滑化IDF、行ごとのL2正規化を行うTF-IDFベクトライザ。
#[derive(Debug, Clone, Default)]
pub struct TfidfVectorizer {
    tokenizer: WordTokenizer,
    vocabulary: HashMap<String, usize>,
    terms: Vec<String>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_tokenizer(tokenizer: WordTokenizer) -> Self {
        Self {
            tokenizer,
            ..Self::default()
        }
    }

    /// 列インデックス順の語彙。
    #[must_use]
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    #[must_use]
    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    #[must_use]
    pub fn column_of(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    fn is_fitted(&self) -> bool {
        !self.terms.is_empty()
    }

    fn build_matrix(&self, tokenized: &[Vec<String>]) -> CsMat<f64> {
        let mut indptr = Vec::with_capacity(tokenized.len() + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();
        indptr.push(0);

        for tokens in tokenized {
            let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
            for token in tokens {
                if let Some(&column) = self.vocabulary.get(token) {
                    *counts.entry(column).or_insert(0.0) += 1.0;
                }
            }

            let weighted: Vec<(usize, f64)> = counts
                .into_iter()
                .map(|(column, tf)| (column, tf * self.idf[column]))
                .collect();
            let norm = weighted.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();

            for (column, weight) in weighted {
                indices.push(column);
                data.push(if norm > 0.0 { weight / norm } else { weight });
            }
            indptr.push(indices.len());
        }

        CsMat::new((tokenized.len(), self.terms.len()), indptr, indices, data)
    }
}

impl Vectorizer for TfidfVectorizer {
    fn fit_transform<S: AsRef<str>>(&mut self, documents: &[S]) -> Result<CsMat<f64>> {
        if documents.is_empty() {
            return Err(TrainerError::EmptyVocabulary);
        }

        let tokenized: Vec<Vec<String>> = documents
            .iter()
            .map(|doc| self.tokenizer.tokenize(doc.as_ref()))
            .collect();

        // 文書頻度（BTreeMapなので語彙は辞書順になる）
        let mut doc_freq: BTreeMap<&str, usize> = BTreeMap::new();
        for tokens in &tokenized {
            let mut seen: Vec<&str> = tokens.iter().map(String::as_str).collect();
            seen.sort_unstable();
            seen.dedup();
            for token in seen {
                *doc_freq.entry(token).or_insert(0) += 1;
            }
        }

        if doc_freq.is_empty() {
            return Err(TrainerError::EmptyVocabulary);
        }

        let total_docs = documents.len() as f64;
        let mut vocabulary = HashMap::with_capacity(doc_freq.len());
        let mut terms = Vec::with_capacity(doc_freq.len());
        let mut idf = Vec::with_capacity(doc_freq.len());
        for (column, (term, df)) in doc_freq.into_iter().enumerate() {
            vocabulary.insert(term.to_string(), column);
            terms.push(term.to_string());
            // IDF(t) = ln((1 + N) / (1 + DF(t))) + 1
            idf.push(((1.0 + total_docs) / (1.0 + df as f64)).ln() + 1.0);
        }

        self.vocabulary = vocabulary;
        self.terms = terms;
        self.idf = idf;

        tracing::info!(
            documents = tokenized.len(),
            vocabulary_size = self.terms.len(),
            "tfidf vocabulary built"
        );

        Ok(self.build_matrix(&tokenized))
    }

    fn transform<S: AsRef<str>>(&self, documents: &[S]) -> Result<CsMat<f64>> {
        if !self.is_fitted() {
            return Err(TrainerError::NotFitted("vectorizer"));
        }
        let tokenized: Vec<Vec<String>> = documents
            .iter()
            .map(|doc| self.tokenizer.tokenize(doc.as_ref()))
            .collect();
        Ok(self.build_matrix(&tokenized))
    }

    fn vocabulary_size(&self) -> usize {
        self.terms.len()
    }
}
