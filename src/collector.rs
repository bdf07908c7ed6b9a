//! 谚语采集器
//!
//! 逐个分类逐页抓取，直到某页没有结果为止，按发现顺序分配 id。
//! 每个分类结束后保存累计列表，中断时已采集的内容不会丢失。

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::analysis::retry::{Sleeper, ThreadSleeper};
use crate::config::ScraperConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::models::ProverbEntry;
use crate::network::Fetcher;
use crate::parsers::html::{find_nodes, has_class, parse_html, text_content};
use crate::storage::dataset;

const TITLE_CLASS: &str = "card-title";

/// 单个列表页上的谚语文本，保持页面顺序
///
/// 标题形如 `谚语 – 释义`，只保留第一个 en dash（其次是第一个连字符）之前的部分。
pub fn extract_proverbs(html: &str) -> Vec<String> {
    let dom = parse_html(html);

    find_nodes(&dom.document, &["h2"])
        .iter()
        .filter(|node| has_class(node, TITLE_CLASS))
        .filter_map(|node| {
            let text = text_content(node);
            let before_dash = text.split('–').next().unwrap_or_default().trim();
            let proverb = before_dash.split('-').next().unwrap_or_default().trim();
            (!proverb.is_empty()).then(|| proverb.to_string())
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySummary {
    pub category: String,
    pub pages: usize,
    pub proverbs: usize,
}

pub struct Collector<F, S = ThreadSleeper> {
    fetcher: F,
    sleeper: S,
    base_url: Url,
    categories: Vec<String>,
    page_delay: Duration,
    output: Option<PathBuf>,
}

impl<F: Fetcher> Collector<F> {
    pub fn new(fetcher: F, config: &ScraperConfig) -> PipelineResult<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            PipelineError::Config(format!("invalid scraper.base_url '{}': {}", config.base_url, e))
        })?;

        Ok(Self {
            fetcher,
            sleeper: ThreadSleeper,
            base_url,
            categories: config.categories.clone(),
            page_delay: config.page_delay,
            output: None,
        })
    }
}

impl<F: Fetcher, S: Sleeper> Collector<F, S> {
    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> Collector<F, S2> {
        Collector {
            fetcher: self.fetcher,
            sleeper,
            base_url: self.base_url,
            categories: self.categories,
            page_delay: self.page_delay,
            output: self.output,
        }
    }

    /// 每个分类结束后把累计列表保存到 `path`
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn page_url(&self, category: &str, page: usize) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("category", category)
            .append_pair("page", &page.to_string());
        url
    }

    /// 采集全部分类，只有保存失败才会中止
    pub fn collect(&self) -> PipelineResult<(Vec<ProverbEntry>, Vec<CategorySummary>)> {
        let mut proverbs: Vec<ProverbEntry> = Vec::new();
        let mut summaries = Vec::with_capacity(self.categories.len());
        let mut next_id: u64 = 1;

        for category in &self.categories {
            tracing::info!("starting category '{}'", category);
            let summary = self.collect_category(category, &mut next_id, &mut proverbs);

            if let Some(ref path) = self.output {
                dataset::save_proverbs(path, &proverbs)?;
            }
            tracing::info!(
                "saved {} proverbs from category '{}'",
                summary.proverbs,
                category
            );
            summaries.push(summary);
        }

        tracing::info!("collected {} proverbs in total", proverbs.len());
        Ok((proverbs, summaries))
    }

    fn collect_category(
        &self,
        category: &str,
        next_id: &mut u64,
        proverbs: &mut Vec<ProverbEntry>,
    ) -> CategorySummary {
        let mut summary = CategorySummary {
            category: category.to_string(),
            ..CategorySummary::default()
        };

        for page in 1.. {
            let url = self.page_url(category, page);
            let html = match self.fetcher.fetch(&url) {
                Ok(Some(html)) => html,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("fetching {} failed: {}", url, e);
                    break;
                }
            };

            let extracted = extract_proverbs(&html);
            if extracted.is_empty() {
                break;
            }

            for text in extracted {
                proverbs.push(ProverbEntry::new(*next_id, text));
                *next_id += 1;
                summary.proverbs += 1;
            }
            summary.pages += 1;

            tracing::info!(
                "collected page {} of category '{}' ({} so far)",
                page,
                category,
                summary.proverbs
            );
            self.sleeper.sleep(self.page_delay);
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_keeps_text_before_dash() {
        let html = r#"<div>
            <h2 class="card-title">ਉੱਚੀ ਦੁਕਾਨ ਫਿੱਕਾ ਪਕਵਾਨ – High shop, bland dish</h2>
            <h2 class="card-title">ਘਰ ਦਾ ਭੇਤੀ ਲੰਕਾ ਢਾਹੇ - insider</h2>
            <h2 class="card-title"> – only meaning</h2>
            <h2 class="title">ignored</h2>
        </div>"#;

        assert_eq!(
            extract_proverbs(html),
            vec!["ਉੱਚੀ ਦੁਕਾਨ ਫਿੱਕਾ ਪਕਵਾਨ", "ਘਰ ਦਾ ਭੇਤੀ ਲੰਕਾ ਢਾਹੇ"]
        );
    }

    #[test]
    fn test_extract_empty_page() {
        assert!(extract_proverbs("<html><body><p>No results</p></body></html>").is_empty());
    }

    #[test]
    fn test_page_url_encodes_category() {
        struct NoFetch;
        impl Fetcher for NoFetch {
            fn fetch(&self, _url: &Url) -> PipelineResult<Option<String>> {
                Ok(None)
            }
        }

        let collector = Collector::new(NoFetch, &crate::config::PipelineConfig::default().scraper)
            .unwrap();
        let url = collector.page_url("ਕ", 2);
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("category".to_string(), "ਕ".to_string()),
                ("page".to_string(), "2".to_string())
            ]
        );
        assert!(url.as_str().starts_with("https://punjabi.com/akhaan?category=%E0%A8%95"));
    }
}
