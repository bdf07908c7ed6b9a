//! 基于罗马化拼写的模糊搜索

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;

use crate::config::SearchConfig;
use crate::error::PipelineResult;
use crate::models::MergedEntry;
use crate::present::fuzzy;
use crate::present::transliterate::{GurmukhiIast, Transliterator};
use crate::storage::dataset;

/// 进程内缓存罗马化结果
pub struct Romanizer<T> {
    transliterator: T,
    memo: HashMap<String, String>,
}

impl<T: Transliterator> Romanizer<T> {
    pub fn new(transliterator: T) -> Self {
        Self {
            transliterator,
            memo: HashMap::new(),
        }
    }

    pub fn romanize(&mut self, gurmukhi: &str) -> String {
        if let Some(known) = self.memo.get(gurmukhi) {
            return known.clone();
        }
        let romanized = self.transliterator.transliterate(gurmukhi);
        self.memo.insert(gurmukhi.to_string(), romanized.clone());
        romanized
    }

    pub fn memoized(&self) -> usize {
        self.memo.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub id: u64,
    pub proverb_gurmukhi: String,
    pub romanized: String,
    pub score: u8,
}

pub struct ProverbIndex {
    entries: Vec<MergedEntry>,
    /// 去重后的罗马化拼写，即匹配候选
    romanized: Vec<String>,
    by_romanized: HashMap<String, usize>,
    limit: usize,
    threshold: u8,
}

impl ProverbIndex {
    /// 为 `entries` 建索引，缺少罗马化拼写的条目当场转写
    pub fn new(entries: Vec<MergedEntry>, config: &SearchConfig) -> Self {
        let mut romanizer = Romanizer::new(GurmukhiIast);
        Self::build(entries, &mut romanizer, config)
    }

    pub fn build<T: Transliterator>(
        mut entries: Vec<MergedEntry>,
        romanizer: &mut Romanizer<T>,
        config: &SearchConfig,
    ) -> Self {
        let mut romanized = Vec::with_capacity(entries.len());
        let mut by_romanized = HashMap::with_capacity(entries.len());

        for (index, entry) in entries.iter_mut().enumerate() {
            let form = match entry.romanized_form {
                Some(ref form) => form.clone(),
                None => {
                    let form = romanizer.romanize(&entry.proverb_gurmukhi);
                    entry.romanized_form = Some(form.clone());
                    form
                }
            };
            // 候选按首次出现顺序去重；重复的拼写指向最后一条
            if by_romanized.insert(form.clone(), index).is_none() {
                romanized.push(form);
            }
        }

        tracing::debug!(entries = entries.len(), "search index built");

        Self {
            entries,
            romanized,
            by_romanized,
            limit: config.limit,
            threshold: config.threshold,
        }
    }

    pub fn load(path: &Path, config: &SearchConfig) -> PipelineResult<Self> {
        let entries = dataset::load_merged(path)?;
        tracing::info!("loaded {} proverbs from {}", entries.len(), path.display());
        Ok(Self::new(entries, config))
    }

    /// 得分严格高于阈值的候选，按得分从高到低
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        if query.trim().is_empty() {
            return Vec::new();
        }

        fuzzy::extract(query, &self.romanized, self.limit)
            .into_iter()
            .filter(|&(_, score)| score > self.threshold)
            .filter_map(|(form, score)| {
                let entry = self.entry_for_romanized(form)?;
                Some(SearchHit {
                    id: entry.id,
                    proverb_gurmukhi: entry.proverb_gurmukhi.clone(),
                    romanized: form.to_string(),
                    score,
                })
            })
            .collect()
    }

    pub fn entry_for_romanized(&self, romanized: &str) -> Option<&MergedEntry> {
        self.by_romanized
            .get(romanized)
            .and_then(|&index| self.entries.get(index))
    }

    pub fn get(&self, id: u64) -> Option<&MergedEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn entries(&self) -> &[MergedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
