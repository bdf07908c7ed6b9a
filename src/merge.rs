//! 合并谚语列表与分析缓存
//!
//! 没有成功分析的谚语不会进入结果，合并后的每条记录都可直接展示。

use std::path::Path;

use crate::error::{PipelineError, PipelineResult};
use crate::models::{MergedEntry, ProverbEntry};
use crate::storage::cache::CacheStore;
use crate::storage::dataset;

/// 保持原列表顺序，按原样的古木基文本查找
pub fn merge(proverbs: &[ProverbEntry], cache: &CacheStore) -> Vec<MergedEntry> {
    proverbs
        .iter()
        .filter_map(|proverb| {
            let analysis = cache.get(&proverb.proverb_gurmukhi)?.analysis()?;
            Some(MergedEntry::new(proverb.clone(), analysis.clone()))
        })
        .collect()
}

/// 读取两个输入，合并后写入 `output`
///
/// 两个输入都必须存在。返回合并的记录数。
pub fn merge_files(proverbs_path: &Path, cache_path: &Path, output: &Path) -> PipelineResult<usize> {
    let proverbs = dataset::load_proverbs(proverbs_path)?;

    if !cache_path.exists() {
        return Err(PipelineError::MissingInput(cache_path.display().to_string()));
    }
    let cache = CacheStore::open(cache_path)?;

    let merged = merge(&proverbs, &cache);
    dataset::save_merged(output, &merged)?;

    let excluded = proverbs.len() - merged.len();
    if excluded > 0 {
        tracing::info!("{} proverbs have no successful analysis and were left out", excluded);
    }
    tracing::info!(
        "merged {} proverbs with analysis into '{}'",
        merged.len(),
        output.display()
    );

    Ok(merged.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Analysis, AnalysisResult};

    fn analysis(meaning: &str) -> AnalysisResult {
        AnalysisResult::Analysis(Analysis {
            actual_translation: meaning.to_string(),
            deeper_analysis: "context".to_string(),
        })
    }

    #[test]
    fn test_merge_keeps_order_and_drops_failures() {
        let mut cache = CacheStore::in_memory();
        cache.insert("ਗ", analysis("third")).unwrap();
        cache.insert("ਕ", analysis("first")).unwrap();
        cache.insert("ਖ", AnalysisResult::error("boom")).unwrap();

        let proverbs = vec![
            ProverbEntry::new(1, "ਕ"),
            ProverbEntry::new(2, "ਖ"),
            ProverbEntry::new(3, "ਗ"),
            ProverbEntry::new(4, "ਘ"),
        ];

        let merged = merge(&proverbs, &cache);
        let ids: Vec<u64> = merged.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(merged[0].analysis.actual_translation, "first");
    }

    #[test]
    fn test_merge_files_requires_cache() {
        let dir = tempfile::tempdir().unwrap();
        let proverbs = dir.path().join("proverbs.json");
        dataset::save_proverbs(&proverbs, &[ProverbEntry::new(1, "ਕ")]).unwrap();

        let result = merge_files(
            &proverbs,
            &dir.path().join("cache.json"),
            &dir.path().join("out.json"),
        );
        assert!(matches!(result, Err(PipelineError::MissingInput(_))));
    }
}
