//! # 网络模块
//!
//! 为采集器获取页面：
//! - [`Fetcher`] 返回解码后的页面内容
//! - 服务器返回非 200 状态时为 `None`

use std::time::Duration;

use encoding_rs::{Encoding, UTF_8};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;
use url::Url;

use crate::error::{PipelineError, PipelineResult};

pub trait Fetcher {
    /// 获取 `url`，非 200 状态返回 `Ok(None)`
    fn fetch(&self, url: &Url) -> PipelineResult<Option<String>>;
}

impl<F: Fetcher + ?Sized> Fetcher for &F {
    fn fetch(&self, url: &Url) -> PipelineResult<Option<String>> {
        (**self).fetch(url)
    }
}

/// 使用固定 `User-Agent` 的阻塞式 HTTP 获取器
pub struct HttpFetcher {
    http: HttpClient,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(user_agent: impl Into<String>, timeout: Duration) -> PipelineResult<Self> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Config(format!("could not build HTTP client: {e}")))?;

        Ok(Self {
            http,
            user_agent: user_agent.into(),
        })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> PipelineResult<Option<String>> {
        let response = self
            .http
            .get(url.as_str())
            .header(USER_AGENT, &self.user_agent)
            .send()?;

        if response.status() != StatusCode::OK {
            tracing::warn!("{} answered {}", url, response.status());
            return Ok(None);
        }

        let charset = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| parse_content_type(value).1)
            .unwrap_or_default();
        let bytes = response.bytes()?;

        Ok(Some(decode_body(&bytes, &charset)))
    }
}

/// 将 Content-Type 拆分为（媒体类型，字符集）
pub fn parse_content_type(content_type: &str) -> (String, String) {
    let mut parts = content_type.split(';');
    let media_type = parts
        .next()
        .map(|part| part.trim().to_lowercase())
        .unwrap_or_default();

    let charset = parts
        .map(str::trim)
        .find_map(|part| part.strip_prefix("charset="))
        .map(|value| value.trim_matches('"').to_string())
        .unwrap_or_default();

    (media_type, charset)
}

/// 解码页面内容，未知字符集回退到 UTF-8
pub fn decode_body(data: &[u8], charset: &str) -> String {
    let encoding = Encoding::for_label(charset.as_bytes()).unwrap_or(UTF_8);
    let (text, _, had_errors) = encoding.decode(data);
    if had_errors {
        tracing::debug!("replaced malformed {} sequences", encoding.name());
    }
    text.into_owned()
}
