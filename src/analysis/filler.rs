//! 直译补全
//!
//! 为缺少直译的谚语向模型请求逐词直译。这里不使用缓存，数据集文件本身就是记录，
//! 整批处理完后重写一次。

use std::path::Path;
use std::time::Duration;

use crate::analysis::client::ChatClient;
use crate::analysis::prompt;
use crate::analysis::retry::{RetryError, RetryPolicy, Sleeper, ThreadSleeper};
use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::models::ProverbEntry;
use crate::storage::dataset;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillReport {
    /// 原本已有直译的条目数
    pub already_filled: usize,
    pub updated: usize,
    /// 因限流而未处理的条目数
    pub rate_limited: usize,
    /// 不可重试的失败后被置为空字符串的条目数
    pub failed: usize,
}

pub struct LiteralFiller<C, S = ThreadSleeper> {
    client: C,
    sleeper: S,
    policy: RetryPolicy,
    courtesy_delay: Duration,
    temperature: f32,
}

impl<C: ChatClient> LiteralFiller<C> {
    pub fn new(client: C, config: &PipelineConfig) -> Self {
        Self {
            client,
            sleeper: ThreadSleeper,
            policy: config.retry.literal.to_policy(),
            courtesy_delay: config.retry.courtesy_delay,
            temperature: config.api.literal_temperature,
        }
    }
}

impl<C: ChatClient, S: Sleeper> LiteralFiller<C, S> {
    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> LiteralFiller<C, S2> {
        LiteralFiller {
            client: self.client,
            sleeper,
            policy: self.policy,
            courtesy_delay: self.courtesy_delay,
            temperature: self.temperature,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 原地补全缺失的直译
    pub fn fill(&self, proverbs: &mut [ProverbEntry]) -> FillReport {
        let mut report = FillReport::default();
        let total = proverbs.len();

        for (index, proverb) in proverbs.iter_mut().enumerate() {
            if proverb.has_literal_translation() {
                report.already_filled += 1;
                continue;
            }

            tracing::info!(
                "translating proverb {}/{}: {}",
                index + 1,
                total,
                proverb.proverb_gurmukhi
            );

            let request = prompt::literal_request(&proverb.proverb_gurmukhi, self.temperature);
            let outcome = self.policy.run(&self.sleeper, |_| {
                self.client
                    .complete(&request)
                    .map(|text| text.trim().to_string())
            });

            match outcome {
                Ok(translation) => {
                    tracing::debug!("literal translation: {}", translation);
                    proverb.literal_translation = translation;
                    report.updated += 1;
                    self.sleeper.sleep(self.courtesy_delay);
                }
                Err(RetryError::Exhausted { .. }) => {
                    tracing::warn!(
                        "rate limit hit, leaving proverb ID {} for a later run",
                        proverb.id
                    );
                    report.rate_limited += 1;
                }
                Err(RetryError::Aborted(e)) => {
                    tracing::error!(
                        "an error occurred translating proverb ID {}: {}",
                        proverb.id,
                        e
                    );
                    proverb.literal_translation = String::new();
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// 加载 `path` 处的数据集，补全后写回一次
    pub fn fill_file(&self, path: &Path) -> PipelineResult<FillReport> {
        let mut proverbs = dataset::load_proverbs(path)?;
        let report = self.fill(&mut proverbs);
        dataset::save_proverbs(path, &proverbs)?;

        tracing::info!(
            "updated {} literal translations in {}",
            report.updated,
            path.display()
        );
        Ok(report)
    }
}
