//! 旁路缓存的分析客户端
//!
//! `get_or_compute_analysis` 优先从缓存返回，未命中时才调用模型。失败不会抛出，
//! 而是缓存并以 [`AnalysisResult::Error`] 返回。本模块唯一的 `Err` 是缓存文件写入失败。

use std::path::Path;
use std::time::Duration;

use crate::analysis::client::ChatClient;
use crate::analysis::prompt;
use crate::analysis::retry::{RetryError, RetryPolicy, Sleeper, ThreadSleeper};
use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::models::{AnalysisResult, ProverbEntry};
use crate::storage::cache::CacheStore;
use crate::storage::dataset;

#[derive(Debug, Clone)]
pub struct AnalyzerOptions {
    pub policy: RetryPolicy,
    pub courtesy_delay: Duration,
    pub temperature: f32,
    /// 重新请求缓存中的错误，而不是直接返回
    pub retry_cached_errors: bool,
}

impl AnalyzerOptions {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            policy: config.retry.analysis.to_policy(),
            courtesy_delay: config.retry.courtesy_delay,
            temperature: config.api.analysis_temperature,
            retry_cached_errors: config.retry.retry_cached_errors,
        }
    }
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalyzerStats {
    pub cache_hits: usize,
    pub analyzed: usize,
    pub failed: usize,
    pub remote_calls: usize,
}

/// 一次批量分析的汇总
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub skipped: usize,
    pub stats: AnalyzerStats,
}

pub struct Analyzer<C, S = ThreadSleeper> {
    client: C,
    cache: CacheStore,
    sleeper: S,
    options: AnalyzerOptions,
    stats: AnalyzerStats,
}

impl<C: ChatClient> Analyzer<C> {
    pub fn new(client: C, cache: CacheStore) -> Self {
        Self {
            client,
            cache,
            sleeper: ThreadSleeper,
            options: AnalyzerOptions::default(),
            stats: AnalyzerStats::default(),
        }
    }
}

impl<C: ChatClient, S: Sleeper> Analyzer<C, S> {
    pub fn with_options(mut self, options: AnalyzerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> Analyzer<C, S2> {
        Analyzer {
            client: self.client,
            cache: self.cache,
            sleeper,
            options: self.options,
            stats: self.stats,
        }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn into_cache(self) -> CacheStore {
        self.cache
    }

    pub fn stats(&self) -> AnalyzerStats {
        self.stats
    }

    /// 返回 `proverb_gurmukhi` 的分析，缓存中没有可用条目时才调用模型
    pub fn get_or_compute_analysis(
        &mut self,
        proverb_gurmukhi: &str,
        literal_translation: &str,
    ) -> PipelineResult<AnalysisResult> {
        if let Some(cached) = self
            .cache
            .lookup(proverb_gurmukhi, self.options.retry_cached_errors)
        {
            tracing::info!("found in cache: '{}'", proverb_gurmukhi);
            self.stats.cache_hits += 1;
            return Ok(cached);
        }

        tracing::info!("analyzing with the model: '{}'", proverb_gurmukhi);

        let request = prompt::analysis_request(
            proverb_gurmukhi,
            literal_translation,
            self.options.temperature,
        );
        let client = &self.client;
        let stats = &mut self.stats;
        let outcome = self.options.policy.run(&self.sleeper, |_| {
            stats.remote_calls += 1;
            let response = client.complete(&request)?;
            prompt::parse_analysis(&response)
        });

        let result = match outcome {
            Ok(analysis) => {
                self.stats.analyzed += 1;
                AnalysisResult::Analysis(analysis)
            }
            Err(RetryError::Exhausted { last, .. }) => {
                let message = format!("API rate limit exceeded after multiple retries: {last}");
                tracing::error!("{}", message);
                self.stats.failed += 1;
                AnalysisResult::error(message)
            }
            Err(RetryError::Aborted(e)) => {
                let message = format!("An unexpected error occurred: {e}");
                tracing::error!("{}", message);
                self.stats.failed += 1;
                AnalysisResult::error(message)
            }
        };

        self.cache.insert(proverb_gurmukhi, result.clone())?;

        if !result.is_error() {
            self.sleeper.sleep(self.options.courtesy_delay);
        }

        Ok(result)
    }

    /// 按顺序分析谚语列表中的每一条
    ///
    /// 缺少古木基文本或直译的条目会记录警告并跳过。
    pub fn analyze_all(&mut self, proverbs: &[ProverbEntry]) -> PipelineResult<BatchSummary> {
        let mut skipped = 0;
        let total = proverbs.len();

        for (index, proverb) in proverbs.iter().enumerate() {
            tracing::info!("processing proverb {}/{}", index + 1, total);

            if proverb.proverb_gurmukhi.trim().is_empty() || !proverb.has_literal_translation() {
                tracing::warn!(
                    "skipping proverb ID {} due to missing Gurmukhi or literal translation",
                    proverb.id
                );
                skipped += 1;
                continue;
            }

            self.get_or_compute_analysis(&proverb.proverb_gurmukhi, &proverb.literal_translation)?;
        }

        Ok(BatchSummary {
            total,
            skipped,
            stats: self.stats,
        })
    }

    /// 加载 `path` 处的谚语列表并逐条分析
    pub fn analyze_file(&mut self, path: &Path) -> PipelineResult<BatchSummary> {
        let proverbs = dataset::load_proverbs(path)?;
        tracing::info!("loaded {} proverbs from {}", proverbs.len(), path.display());
        self.analyze_all(&proverbs)
    }
}
