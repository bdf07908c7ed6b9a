//! 进程环境变量访问
//!
//! 密钥只从环境变量读取（可由 [`crate::config`] 预先从 `.env` 文件注入），
//! 不会出现在配置文件里。

use std::env;
use std::fmt;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl EnvError {
    fn new(variable: &str, message: impl Into<String>) -> Self {
        Self {
            variable: variable.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 类型化的环境变量
///
/// 实现者只给出名称、说明和解析规则；取值方式由 `lookup` / `require` 统一处理。
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    /// 未设置时为 `None`；一旦设置就必须能解析
    fn lookup() -> EnvResult<Option<T>> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value).map(Some),
            Err(env::VarError::NotPresent) => Ok(None),
            Err(env::VarError::NotUnicode(_)) => {
                Err(EnvError::new(Self::NAME, "Value is not valid UTF-8"))
            }
        }
    }

    /// 必需变量，未设置即报错
    fn require() -> EnvResult<T> {
        Self::lookup()?
            .ok_or_else(|| EnvError::new(Self::NAME, "Required environment variable not set"))
    }
}

pub mod core {
    use super::*;

    /// 日志级别，命令行参数优先
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "AKHAAN_LOG_LEVEL";
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn parse(value: &str) -> EnvResult<String> {
            parse_log_level(value, Self::NAME)
        }
    }
}

/// 文本生成服务
pub mod api {
    use super::*;

    pub struct ApiKey;
    impl EnvVar<String> for ApiKey {
        const NAME: &'static str = "GROQ_API_KEY";
        const DESCRIPTION: &'static str = "API key for the text-generation service (required)";

        fn parse(value: &str) -> EnvResult<String> {
            parse_secret(value, Self::NAME)
        }
    }
}

/// 评估工具
pub mod eval {
    use super::*;

    /// 向量接口的密钥，可选
    pub struct EmbeddingApiKey;
    impl EnvVar<String> for EmbeddingApiKey {
        const NAME: &'static str = "EMBEDDING_API_KEY";
        const DESCRIPTION: &'static str =
            "API key for the embeddings endpoint used by the evaluation harness";

        fn parse(value: &str) -> EnvResult<String> {
            parse_secret(value, Self::NAME)
        }
    }
}

fn parse_secret(value: &str, name: &str) -> EnvResult<String> {
    match value.trim() {
        "" => Err(EnvError::new(name, "Value must not be empty")),
        secret => Ok(secret.to_string()),
    }
}

pub(crate) fn parse_log_level(value: &str, name: &str) -> EnvResult<String> {
    match value.trim().to_lowercase().as_str() {
        level @ ("trace" | "debug" | "info" | "warn" | "error") => Ok(level.to_string()),
        _ => Err(EnvError::new(
            name,
            format!("Invalid log level '{value}'. Use: trace, debug, info, warn, error"),
        )),
    }
}

/// 本工具读取的全部环境变量及说明，`akhaan config` 会打印
pub fn describe_all() -> Vec<(&'static str, &'static str)> {
    vec![
        (core::LogLevel::NAME, core::LogLevel::DESCRIPTION),
        (api::ApiKey::NAME, api::ApiKey::DESCRIPTION),
        (eval::EmbeddingApiKey::NAME, eval::EmbeddingApiKey::DESCRIPTION),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    // 每个测试用自己的变量名，避免并行测试互相干扰
    struct Unset;
    impl EnvVar<String> for Unset {
        const NAME: &'static str = "AKHAAN_TEST_UNSET_SECRET";
        const DESCRIPTION: &'static str = "";

        fn parse(value: &str) -> EnvResult<String> {
            parse_secret(value, Self::NAME)
        }
    }

    struct Blank;
    impl EnvVar<String> for Blank {
        const NAME: &'static str = "AKHAAN_TEST_BLANK_SECRET";
        const DESCRIPTION: &'static str = "";

        fn parse(value: &str) -> EnvResult<String> {
            parse_secret(value, Self::NAME)
        }
    }

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("DEBUG", "X").unwrap(), "debug");
        assert_eq!(parse_log_level(" warn ", "X").unwrap(), "warn");
        assert!(parse_log_level("loud", "X").is_err());
    }

    #[test]
    fn test_blank_secret_rejected() {
        let error = parse_secret("   ", "GROQ_API_KEY").unwrap_err();
        assert_eq!(error.variable, "GROQ_API_KEY");
        assert_eq!(parse_secret(" sk-1 ", "GROQ_API_KEY").unwrap(), "sk-1");
    }

    #[test]
    fn test_unset_variable_is_none_until_required() {
        assert!(Unset::lookup().unwrap().is_none());

        let error = Unset::require().unwrap_err();
        assert_eq!(error.variable, "AKHAAN_TEST_UNSET_SECRET");
        assert!(error.to_string().contains("not set"));
    }

    #[test]
    fn test_set_but_blank_variable_is_an_error() {
        env::set_var(Blank::NAME, "  ");
        assert!(Blank::lookup().is_err());

        env::set_var(Blank::NAME, " sk-2 ");
        assert_eq!(Blank::lookup().unwrap().as_deref(), Some("sk-2"));
        env::remove_var(Blank::NAME);
    }

    #[test]
    fn test_describe_all_lists_api_key() {
        assert!(describe_all()
            .iter()
            .any(|(name, _)| *name == "GROQ_API_KEY"));
    }
}
