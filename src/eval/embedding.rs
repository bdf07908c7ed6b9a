//! 语义相似度指标使用的句向量

use std::time::Duration;

use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::env::{eval::EmbeddingApiKey, EnvVar};
use crate::error::{PipelineError, PipelineResult};

pub trait Embedder {
    /// 每个输入一个向量，顺序与输入一致
    fn embed(&self, texts: &[String]) -> PipelineResult<Vec<Vec<f32>>>;
}

impl<E: Embedder + ?Sized> Embedder for &E {
    fn embed(&self, texts: &[String]) -> PipelineResult<Vec<Vec<f32>>> {
        (**self).embed(texts)
    }
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn embed(&self, texts: &[String]) -> PipelineResult<Vec<Vec<f32>>> {
        (**self).embed(texts)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

/// OpenAI 兼容 `/embeddings` 接口的客户端
pub struct HttpEmbedder {
    http: HttpClient,
    url: String,
    model: String,
}

impl HttpEmbedder {
    pub fn new(
        url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> PipelineResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key {
            let mut auth = HeaderValue::from_str(&format!("Bearer {key}")).map_err(|_| {
                PipelineError::Config("embedding API key contains invalid characters".to_string())
            })?;
            auth.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth);
        }

        let http = HttpClient::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Config(format!("could not build HTTP client: {e}")))?;

        Ok(Self {
            http,
            url: url.into(),
            model: model.into(),
        })
    }

    /// 未配置向量接口时为 `None`；`EMBEDDING_API_KEY` 设置为空值时报配置错误
    pub fn from_config(config: &PipelineConfig) -> PipelineResult<Option<Self>> {
        let Some(ref url) = config.embeddings.url else {
            return Ok(None);
        };
        let api_key = EmbeddingApiKey::lookup()?;
        let embedder = Self::new(
            url.clone(),
            config.embeddings.model.clone(),
            api_key.as_deref(),
            config.api.timeout,
        )?;
        tracing::info!(url = %url, model = %embedder.model, "embedding endpoint configured");
        Ok(Some(embedder))
    }
}

impl Embedder for HttpEmbedder {
    fn embed(&self, texts: &[String]) -> PipelineResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };
        let response = self.http.post(&self.url).json(&request).send()?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(PipelineError::Api(format!("embeddings {status}: {detail}")));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .map_err(|e| PipelineError::Parse(format!("malformed embeddings response: {e}")))?;
        order_vectors(parsed.data, texts.len())
    }
}

fn order_vectors(mut items: Vec<EmbeddingItem>, expected: usize) -> PipelineResult<Vec<Vec<f32>>> {
    if items.len() != expected {
        return Err(PipelineError::Parse(format!(
            "expected {expected} embeddings, got {}",
            items.len()
        )));
    }
    if items.iter().all(|item| item.index.is_some()) {
        items.sort_by_key(|item| item.index);
    }
    Ok(items.into_iter().map(|item| item.embedding).collect())
}

/// 两个向量的余弦相似度，空向量或零向量为 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let len = a.len().min(b.len());
    if len == 0 {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b.iter()).take(len) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
