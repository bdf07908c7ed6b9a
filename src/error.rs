//! 流水线统一错误处理
//!
//! 可恢复的远程失败由调用方转换成错误形态的值（见 [`crate::models::AnalysisResult`]）；
//! 以 `PipelineError` 到达 `main` 的错误会被报告并结束进程。

use std::fmt;

use thiserror::Error;

use crate::env::EnvError;

/// 流水线错误类型
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    /// 配置缺失或无效，包括 API 密钥
    #[error("configuration error: {0}")]
    Config(String),

    /// 必需的输入文件不存在
    #[error("required file not found: {0}")]
    MissingInput(String),

    /// 输入文件存在但无法使用
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// 远程服务限流
    #[error("rate limit reached: {0}")]
    RateLimited(String),

    /// 传输层失败
    #[error("network error: {0}")]
    Network(String),

    /// 远程服务返回了意外的状态码或响应体
    #[error("API error: {0}")]
    Api(String),

    /// 模型响应无法解析
    #[error("parse error: {0}")]
    Parse(String),

    /// 文件系统错误
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON 或 TOML 编解码错误
    #[error("serialization error: {0}")]
    Serialization(String),

    /// 评估没有产出可打分的结果
    #[error("no valid proverb analyses were generated")]
    NoSuccessfulAnalyses,
}

impl PipelineError {
    /// 是否为重试策略会处理的限流错误
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, PipelineError::RateLimited(_))
    }

    /// 是否必须中止当前命令
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PipelineError::Config(_)
                | PipelineError::MissingInput(_)
                | PipelineError::InvalidInput(_)
                | PipelineError::NoSuccessfulAnalyses
        )
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            PipelineError::Config(_) => ErrorCategory::Configuration,
            PipelineError::MissingInput(_) | PipelineError::InvalidInput(_) => ErrorCategory::Input,
            PipelineError::RateLimited(_) => ErrorCategory::RateLimit,
            PipelineError::Network(_) => ErrorCategory::Network,
            PipelineError::Api(_) => ErrorCategory::Service,
            PipelineError::Parse(_) => ErrorCategory::Parsing,
            PipelineError::Io(_) => ErrorCategory::Storage,
            PipelineError::Serialization(_) => ErrorCategory::Serialization,
            PipelineError::NoSuccessfulAnalyses => ErrorCategory::Evaluation,
        }
    }

    /// 在错误信息后追加上下文，保持错误类型不变
    pub fn with_context<T: fmt::Display>(self, context: T) -> Self {
        match self {
            PipelineError::Config(msg) => PipelineError::Config(format!("{msg} ({context})")),
            PipelineError::MissingInput(msg) => {
                PipelineError::MissingInput(format!("{msg} ({context})"))
            }
            PipelineError::InvalidInput(msg) => {
                PipelineError::InvalidInput(format!("{msg} ({context})"))
            }
            PipelineError::RateLimited(msg) => {
                PipelineError::RateLimited(format!("{msg} ({context})"))
            }
            PipelineError::Network(msg) => PipelineError::Network(format!("{msg} ({context})")),
            PipelineError::Api(msg) => PipelineError::Api(format!("{msg} ({context})")),
            PipelineError::Parse(msg) => PipelineError::Parse(format!("{msg} ({context})")),
            PipelineError::Io(msg) => PipelineError::Io(format!("{msg} ({context})")),
            PipelineError::Serialization(msg) => {
                PipelineError::Serialization(format!("{msg} ({context})"))
            }
            PipelineError::NoSuccessfulAnalyses => PipelineError::NoSuccessfulAnalyses,
        }
    }
}

/// 错误类别，用于日志字段和退出码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    Input,
    RateLimit,
    Network,
    Service,
    Parsing,
    Storage,
    Serialization,
    Evaluation,
}

impl From<std::io::Error> for PipelineError {
    fn from(error: std::io::Error) -> Self {
        PipelineError::Io(error.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(error: serde_json::Error) -> Self {
        PipelineError::Serialization(format!("JSON: {error}"))
    }
}

impl From<toml::ser::Error> for PipelineError {
    fn from(error: toml::ser::Error) -> Self {
        PipelineError::Serialization(format!("TOML: {error}"))
    }
}

impl From<config::ConfigError> for PipelineError {
    fn from(error: config::ConfigError) -> Self {
        PipelineError::Config(error.to_string())
    }
}

impl From<EnvError> for PipelineError {
    fn from(error: EnvError) -> Self {
        PipelineError::Config(error.to_string())
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(error: reqwest::Error) -> Self {
        if error.status() == Some(reqwest::StatusCode::TOO_MANY_REQUESTS) {
            PipelineError::RateLimited(error.to_string())
        } else if error.is_decode() {
            PipelineError::Parse(error.to_string())
        } else {
            PipelineError::Network(error.to_string())
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
