//! 分析缓存
//!
//! 扁平 JSON 对象，从谚语原文映射到 [`AnalysisResult`]。键为原样的古木基文本，不做规范化。
//! 每次修改都整体重写文件，并发写入时后写者覆盖先写者。

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};
use crate::models::AnalysisResult;
use crate::storage::dataset::write_json_file;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub writes: usize,
}

#[derive(Debug)]
pub struct CacheStore {
    path: Option<PathBuf>,
    entries: BTreeMap<String, AnalysisResult>,
    stats: CacheStats,
}

impl CacheStore {
    /// 打开 `path` 处的缓存，文件不存在即为空缓存
    pub fn open(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let entries = if path.exists() {
            let data = std::fs::read_to_string(path)
                .map_err(|e| PipelineError::from(e).with_context(path.display()))?;
            serde_json::from_str(&data).map_err(|e| {
                PipelineError::InvalidInput(format!(
                    "cache {} contains invalid JSON: {}",
                    path.display(),
                    e
                ))
            })?
        } else {
            BTreeMap::new()
        };

        tracing::debug!(path = %path.display(), entries = entries.len(), "cache opened");

        Ok(Self {
            path: Some(path.to_path_buf()),
            entries,
            stats: CacheStats::default(),
        })
    }

    /// 不落盘的缓存
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: BTreeMap::new(),
            stats: CacheStats::default(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<&AnalysisResult> {
        self.entries.get(key)
    }

    /// 查找可用的分析结果，并统计命中与未命中
    ///
    /// 设置 `errors_are_misses` 时，错误条目计为未命中。
    pub fn lookup(&mut self, key: &str, errors_are_misses: bool) -> Option<AnalysisResult> {
        match self.entries.get(key) {
            Some(result) if !(errors_are_misses && result.is_error()) => {
                self.stats.hits += 1;
                Some(result.clone())
            }
            _ => {
                self.stats.misses += 1;
                None
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// 写入 `key` 对应的结果并重写文件
    pub fn insert(&mut self, key: impl Into<String>, result: AnalysisResult) -> PipelineResult<()> {
        self.entries.insert(key.into(), result);
        self.stats.writes += 1;
        self.persist()
    }

    /// 删除 `key`，下次调用重新计算
    pub fn remove(&mut self, key: &str) -> PipelineResult<bool> {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.stats.writes += 1;
            self.persist()?;
        }
        Ok(removed)
    }

    /// 删除所有缓存的错误，返回删除条数
    pub fn clear_errors(&mut self) -> PipelineResult<usize> {
        let before = self.entries.len();
        self.entries.retain(|_, result| !result.is_error());
        let removed = before - self.entries.len();
        if removed > 0 {
            self.stats.writes += 1;
            self.persist()?;
        }
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.entries.values().filter(|r| r.is_error()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AnalysisResult)> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &BTreeMap<String, AnalysisResult> {
        &self.entries
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    fn persist(&self) -> PipelineResult<()> {
        match self.path {
            Some(ref path) => write_json_file(path, &self.entries),
            None => Ok(()),
        }
    }
}
