//! 对话补全客户端
//!
//! 使用 Groq 提供的 OpenAI 兼容 `chat/completions` 协议。HTTP 429 映射为
//! [`PipelineError::RateLimited`]，其他失败都映射为不可重试的错误。

use std::time::Duration;

use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::env::{api::ApiKey, EnvVar};
use crate::error::{PipelineError, PipelineResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// 发往文本生成服务的一次请求
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    /// 要求服务返回 JSON 对象
    pub json_response: bool,
}

/// 远程文本生成服务
pub trait ChatClient {
    /// 返回第一个 choice 的文本
    fn complete(&self, request: &ChatRequest) -> PipelineResult<String>;
}

impl<C: ChatClient + ?Sized> ChatClient for &C {
    fn complete(&self, request: &ChatRequest) -> PipelineResult<String> {
        (**self).complete(request)
    }
}

impl<C: ChatClient + ?Sized> ChatClient for Box<C> {
    fn complete(&self, request: &ChatRequest) -> PipelineResult<String> {
        (**self).complete(request)
    }
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI 兼容接口的阻塞式客户端
pub struct GroqClient {
    http: HttpClient,
    endpoint: String,
    model: String,
}

impl GroqClient {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: &str,
        timeout: Duration,
    ) -> PipelineResult<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| PipelineError::Config("API key contains invalid characters".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = HttpClient::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Config(format!("could not build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            model: model.into(),
        })
    }

    /// 根据配置和 `GROQ_API_KEY` 构建客户端
    ///
    /// 缺少密钥属于配置错误。
    pub fn from_config(config: &PipelineConfig) -> PipelineResult<Self> {
        let api_key = ApiKey::require()?;
        let client = Self::new(
            config.chat_completions_url(),
            config.api.model.clone(),
            &api_key,
            config.api.timeout,
        )?;
        tracing::info!(model = %client.model, "text-generation client configured");
        Ok(client)
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl ChatClient for GroqClient {
    fn complete(&self, request: &ChatRequest) -> PipelineResult<String> {
        let body = CompletionBody {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            response_format: request
                .json_response
                .then_some(ResponseFormat { kind: "json_object" }),
        };

        let response = self.http.post(&self.endpoint).json(&body).send()?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let detail = response.text().unwrap_or_default();
            return Err(PipelineError::RateLimited(format!(
                "{status}: {}",
                truncate(&detail, 200)
            )));
        }

        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(PipelineError::Api(format!(
                "{status}: {}",
                truncate(&detail, 200)
            )));
        }

        let parsed: CompletionResponse = response
            .json()
            .map_err(|e| PipelineError::Parse(format!("malformed completion response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| PipelineError::Parse("completion response has no content".to_string()))
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_requests_json_object() {
        let messages = vec![ChatMessage::system("s"), ChatMessage::user("u")];
        let body = CompletionBody {
            model: "llama3-70b-8192",
            messages: &messages,
            temperature: 0.0,
            response_format: Some(ResponseFormat { kind: "json_object" }),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["response_format"]["type"], "json_object");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "u");
    }

    #[test]
    fn test_plain_body_omits_response_format() {
        let body = CompletionBody {
            model: "m",
            messages: &[],
            temperature: 0.0,
            response_format: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("response_format").is_none());
    }

    #[test]
    fn test_response_content_extraction() {
        let parsed: CompletionResponse = serde_json::from_str(
            r#"{"id": "x", "choices": [{"index": 0, "message": {"role": "assistant", "content": "{}"}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("{}"));
    }

    /// 在本地端口返回一次预设的 HTTP 响应，并返回接口地址
    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        use std::io::{BufRead, BufReader, Read, Write};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();

        std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap_or(0);
                    }
                }
            }
            let mut request_body = vec![0u8; content_length];
            reader.read_exact(&mut request_body).unwrap();

            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let mut stream = reader.into_inner();
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
        });

        format!("http://{address}/v1/chat/completions")
    }

    fn complete_against(status_line: &'static str, body: &'static str) -> PipelineResult<String> {
        let endpoint = serve_once(status_line, body);
        let client =
            GroqClient::new(endpoint, "llama3-70b-8192", "test-key", Duration::from_secs(5)).unwrap();
        let request = ChatRequest {
            messages: vec![ChatMessage::user("ਉੱਚੀ ਦੁਕਾਨ ਫਿੱਕਾ ਪਕਵਾਨ")],
            temperature: 0.0,
            json_response: true,
        };
        client.complete(&request)
    }

    #[test]
    fn test_too_many_requests_is_rate_limited() {
        let error = complete_against("429 Too Many Requests", "slow").unwrap_err();
        assert!(error.is_rate_limit());
        assert!(matches!(error, PipelineError::RateLimited(ref msg) if msg.contains("slow")));
    }

    #[test]
    fn test_server_error_is_not_retryable() {
        let error = complete_against("500 Internal Server Error", "boom").unwrap_err();
        assert!(matches!(error, PipelineError::Api(ref msg) if msg.starts_with("500")));
        assert!(!error.is_rate_limit());
    }

    #[test]
    fn test_response_without_choices_is_parse_error() {
        let error = complete_against("200 OK", r#"{"choices": []}"#).unwrap_err();
        assert!(matches!(error, PipelineError::Parse(_)));
    }

    #[test]
    fn test_successful_completion_returns_content() {
        let text = complete_against(
            "200 OK",
            r#"{"choices": [{"message": {"role": "assistant", "content": "{\"a\": 1}"}}]}"#,
        )
        .unwrap();
        assert_eq!(text, "{\"a\": 1}");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("ਉੱਚੀ", 2), "ਉੱ");
        assert_eq!(truncate("abc", 10), "abc");
    }
}
