//! 金标准集评估
//!
//! 通过常规分析路径为每条金标准谚语生成释义（复用缓存结果），再与人工参考对比打分。

use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::Analyzer;
use crate::analysis::client::ChatClient;
use crate::analysis::retry::Sleeper;
use crate::error::{PipelineError, PipelineResult};
use crate::eval::embedding::{cosine_similarity, Embedder};
use crate::eval::rouge::rouge_l;
use crate::models::GoldEntry;
use crate::storage::dataset;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedPair {
    pub id: u64,
    pub proverb_gurmukhi: String,
    pub reference: String,
    pub generated: String,
    pub rouge_l_f1: f64,
    pub embedding_similarity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub evaluated: usize,
    pub skipped: usize,
    /// ROUGE-L F1 平均值，百分比
    pub rouge_l_f1: f64,
    /// 向量余弦相似度平均值，百分比；指标不可用时为 `None`
    pub embedding_similarity: Option<f64>,
    /// RFC 3339 时间戳
    pub generated_at: String,
    pub pairs: Vec<EvaluatedPair>,
}

impl EvaluationReport {
    pub fn summary(&self) -> String {
        let embedding = match self.embedding_similarity {
            Some(value) => format!("{value:.2}%"),
            None => "unavailable".to_string(),
        };
        format!(
            "Evaluated: {}\nSkipped: {}\nAverage ROUGE-L (F1-Score): {:.2}%\nAverage embedding similarity: {}",
            self.evaluated, self.skipped, self.rouge_l_f1, embedding
        )
    }

    pub fn save(&self, path: &Path) -> PipelineResult<()> {
        dataset::write_json_file(path, self)
    }
}

/// 为分析器能回答的每条金标准记录打分
///
/// 一条都没有时返回 [`PipelineError::NoSuccessfulAnalyses`]。
pub fn evaluate<C: ChatClient, S: Sleeper>(
    analyzer: &mut Analyzer<C, S>,
    gold: &[GoldEntry],
    embedder: Option<&dyn Embedder>,
) -> PipelineResult<EvaluationReport> {
    let total = gold.len();
    let mut pairs = Vec::new();

    for (index, entry) in gold.iter().enumerate() {
        tracing::info!(
            "processing proverb {}/{}: {}",
            index + 1,
            total,
            entry.proverb_gurmukhi
        );

        let result =
            analyzer.get_or_compute_analysis(&entry.proverb_gurmukhi, &entry.literal_translation)?;

        let generated = result
            .analysis()
            .map(|analysis| analysis.actual_translation.trim())
            .filter(|meaning| !meaning.is_empty());

        match (entry.reference_meaning(), generated) {
            (Some(reference), Some(generated)) => {
                let rouge = rouge_l(reference, generated).fmeasure;
                pairs.push(EvaluatedPair {
                    id: entry.id,
                    proverb_gurmukhi: entry.proverb_gurmukhi.clone(),
                    reference: reference.to_string(),
                    generated: generated.to_string(),
                    rouge_l_f1: rouge * 100.0,
                    embedding_similarity: None,
                });
            }
            _ => {
                tracing::warn!(
                    "skipping proverb ID {} due to an error in analysis or a missing meaning",
                    entry.id
                );
            }
        }
    }

    if pairs.is_empty() {
        return Err(PipelineError::NoSuccessfulAnalyses);
    }

    let embedding_similarity = match embedder {
        Some(embedder) => score_embeddings(embedder, &mut pairs),
        None => {
            tracing::info!("no embedding endpoint configured, semantic similarity unavailable");
            None
        }
    };

    let evaluated = pairs.len();
    let rouge_l_f1 = pairs.iter().map(|pair| pair.rouge_l_f1).sum::<f64>() / evaluated as f64;

    Ok(EvaluationReport {
        evaluated,
        skipped: total - evaluated,
        rouge_l_f1,
        embedding_similarity,
        generated_at: Utc::now().to_rfc3339(),
        pairs,
    })
}

/// 填入逐条相似度，返回百分比平均值
fn score_embeddings(embedder: &dyn Embedder, pairs: &mut [EvaluatedPair]) -> Option<f64> {
    let generated: Vec<String> = pairs.iter().map(|pair| pair.generated.clone()).collect();
    let references: Vec<String> = pairs.iter().map(|pair| pair.reference.clone()).collect();

    let vectors = embedder
        .embed(&generated)
        .and_then(|generated_vectors| Ok((generated_vectors, embedder.embed(&references)?)));

    let (generated, references) = match vectors {
        Ok(vectors) => vectors,
        Err(e) => {
            tracing::error!("embedding request failed, semantic similarity unavailable: {}", e);
            return None;
        }
    };

    if generated.len() != pairs.len() || references.len() != pairs.len() {
        tracing::error!("embedding endpoint returned the wrong number of vectors");
        return None;
    }

    let mut total = 0.0;
    for ((pair, a), b) in pairs.iter_mut().zip(&generated).zip(&references) {
        let similarity = cosine_similarity(a, b) * 100.0;
        pair.embedding_similarity = Some(similarity);
        total += similarity;
    }

    Some(total / pairs.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::client::ChatRequest;
    use crate::analysis::retry::tests::RecordingSleeper;
    use crate::models::{Analysis, AnalysisResult, IdealAnalysis};
    use crate::storage::cache::CacheStore;

    struct NoRemote;

    impl ChatClient for NoRemote {
        fn complete(&self, _request: &ChatRequest) -> PipelineResult<String> {
            Err(PipelineError::Api("offline".to_string()))
        }
    }

    struct FixedEmbedder;

    impl Embedder for FixedEmbedder {
        fn embed(&self, texts: &[String]) -> PipelineResult<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    fn gold(id: u64, gurmukhi: &str, meaning: Option<&str>) -> GoldEntry {
        GoldEntry {
            id,
            proverb_gurmukhi: gurmukhi.to_string(),
            literal_translation: "literal".to_string(),
            ideal_analysis: Some(IdealAnalysis {
                meaning: meaning.map(str::to_string),
            }),
        }
    }

    fn cached(meaning: &str) -> AnalysisResult {
        AnalysisResult::Analysis(Analysis {
            actual_translation: meaning.to_string(),
            deeper_analysis: String::new(),
        })
    }

    #[test]
    fn test_scores_only_usable_pairs() {
        let mut cache = CacheStore::in_memory();
        cache.insert("ਕ", cached("a fancy shop with bland food")).unwrap();
        cache.insert("ਖ", cached("anything")).unwrap();
        let mut analyzer = Analyzer::new(NoRemote, cache).with_sleeper(RecordingSleeper::default());

        let entries = vec![
            gold(1, "ਕ", Some("a fancy shop with bland food")),
            gold(2, "ਖ", None),
            gold(3, "ਗ", Some("remote call fails here")),
        ];

        let report = evaluate(&mut analyzer, &entries, Some(&FixedEmbedder as &dyn Embedder)).unwrap();

        assert_eq!(report.evaluated, 1);
        assert_eq!(report.skipped, 2);
        assert!((report.rouge_l_f1 - 100.0).abs() < 1e-9);
        assert_eq!(report.embedding_similarity, Some(100.0));
        assert!(report.summary().contains("100.00%"));
    }

    #[test]
    fn test_no_successful_analyses_is_an_error() {
        let mut analyzer = Analyzer::new(NoRemote, CacheStore::in_memory())
            .with_sleeper(RecordingSleeper::default());
        let entries = vec![gold(1, "ਕ", Some("meaning"))];

        assert!(matches!(
            evaluate(&mut analyzer, &entries, None),
            Err(PipelineError::NoSuccessfulAnalyses)
        ));
    }

    #[test]
    fn test_embedding_metric_unavailable_without_embedder() {
        let mut cache = CacheStore::in_memory();
        cache.insert("ਕ", cached("the cat sat")).unwrap();
        let mut analyzer = Analyzer::new(NoRemote, cache).with_sleeper(RecordingSleeper::default());

        let report = evaluate(&mut analyzer, &[gold(1, "ਕ", Some("the cat ran"))], None).unwrap();

        assert_eq!(report.embedding_similarity, None);
        assert!(report.summary().contains("unavailable"));
        assert!((report.rouge_l_f1 - 200.0 / 3.0).abs() < 1e-9);
    }
}
