//! ラベル変換・特徴抽出・線形分類器。
pub mod features;
pub mod labels;
pub mod model;
pub mod tokenizer;

pub use features::{TfidfVectorizer, Vectorizer};
pub use labels::{SentimentLabel, map_labels, sentiment_score, unrecognized_labels};
pub use model::{Classifier, LinearSvc, Penalty, SvcParams};
pub use tokenizer::WordTokenizer;
