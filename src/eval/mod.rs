//! 生成释义的质量评估

pub mod embedding;
pub mod harness;
pub mod rouge;

pub use embedding::{cosine_similarity, Embedder, HttpEmbedder};
pub use harness::{evaluate, EvaluatedPair, EvaluationReport};
pub use rouge::{rouge_l, RougeScore};
