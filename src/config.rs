//! 配置加载
//!
//! 优先级从低到高：内置默认值、找到的第一个配置文件（或命令行指定的文件）、
//! `AKHAAN_*` 环境变量（如 `AKHAAN_FILES__CACHE=other.json`）。

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::analysis::retry::{Backoff, RetryPolicy};
use crate::error::{PipelineError, PipelineResult};

pub mod constants {
    pub const CONFIG_PATHS: &[&str] = &[
        "akhaan.toml",
        ".akhaan.toml",
        "~/.config/akhaan/config.toml",
    ];

    pub const ENV_FILES: &[&str] = &[".env.local", ".env"];

    pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1";
    pub const DEFAULT_MODEL: &str = "llama3-70b-8192";
    pub const DEFAULT_ANALYSIS_TEMPERATURE: f32 = 0.2;
    pub const DEFAULT_LITERAL_TEMPERATURE: f32 = 0.0;
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

    pub const PROVERBS_FILE: &str = "punjabi_proverbs.json";
    pub const CACHE_FILE: &str = "analysis_cache_final_direct_meaning.json";
    pub const APP_DATA_FILE: &str = "proverbs_app_data.json";
    pub const GOLD_FILE: &str = "gold_standard_evaluation_set.json";

    pub const ANALYSIS_MAX_ATTEMPTS: usize = 5;
    pub const ANALYSIS_BASE_DELAY_SECS: f64 = 5.0;
    pub const LITERAL_MAX_ATTEMPTS: usize = 1;
    pub const LITERAL_RATE_LIMIT_DELAY_SECS: f64 = 10.0;
    pub const COURTESY_DELAY_SECS: f64 = 0.5;

    pub const SCRAPER_BASE_URL: &str = "https://punjabi.com/akhaan";
    pub const SCRAPER_USER_AGENT: &str = "Mozilla/5.0";
    pub const PAGE_DELAY_SECS: f64 = 1.0;

    /// 列表分类，按网站顺序（不含网站的“全部”标签）
    pub const CATEGORIES: &[&str] = &[
        "ੳ", "ਅ", "ੲ", "ਸ", "ਹ", "ਕ", "ਖ", "ਗ", "ਘ", "ਚ", "ਛ", "ਜ", "ਝ", "ਟ", "ਠ", "ਡ", "ਢ",
        "ਤ", "ਥ", "ਦ", "ਧ", "ਨ", "ਪ", "ਫ", "ਬ", "ਭ", "ਮ", "ਯ", "ਰ", "ਲ", "ਵ",
    ];

    pub const SEARCH_LIMIT: usize = 3;
    pub const SEARCH_THRESHOLD: u8 = 50;

    pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

    pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
    pub const DEFAULT_PORT: u16 = 8501;
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    pub api: ApiConfig,
    pub files: FilesConfig,
    pub retry: RetryConfig,
    pub scraper: ScraperConfig,
    pub search: SearchConfig,
    pub embeddings: EmbeddingsConfig,
    pub web: WebConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// OpenAI 兼容 API 的基础地址，不含接口路径
    pub base_url: String,
    pub model: String,
    pub analysis_temperature: f32,
    pub literal_temperature: f32,
    #[serde(with = "duration_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilesConfig {
    pub proverbs: String,
    pub cache: String,
    pub app_data: String,
    pub gold: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// 每次远程调用成功后的停顿
    #[serde(with = "duration_serde")]
    pub courtesy_delay: Duration,
    /// 缓存中的错误条目在之后的调用中是否重新请求
    pub retry_cached_errors: bool,
    pub analysis: RetryPolicyConfig,
    pub literal: RetryPolicyConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    Exponential,
    Fixed,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryPolicyConfig {
    pub max_attempts: usize,
    pub backoff: BackoffKind,
    #[serde(with = "duration_serde")]
    pub base_delay: Duration,
    /// 最后一次限流后是否再等待一个退避间隔
    pub cooldown_on_exhaustion: bool,
}

impl RetryPolicyConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        let backoff = match self.backoff {
            BackoffKind::Exponential => Backoff::Exponential {
                base: self.base_delay,
            },
            BackoffKind::Fixed => Backoff::Fixed(self.base_delay),
        };
        RetryPolicy::new(self.max_attempts, backoff).with_cooldown(self.cooldown_on_exhaustion)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    pub base_url: String,
    pub user_agent: String,
    #[serde(with = "duration_serde")]
    pub page_delay: Duration,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    pub limit: usize,
    /// 候选得分必须严格高于此值（0-100）
    pub threshold: u8,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingsConfig {
    /// OpenAI 兼容 `/embeddings` 接口的完整地址
    pub url: Option<String>,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebConfig {
    pub bind_addr: String,
    pub port: u16,
}

/// 时长以秒为单位书写，可带小数
mod duration_serde {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(de::Error::custom)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let analysis = RetryPolicyConfig {
            max_attempts: constants::ANALYSIS_MAX_ATTEMPTS,
            backoff: BackoffKind::Exponential,
            base_delay: Duration::from_secs_f64(constants::ANALYSIS_BASE_DELAY_SECS),
            cooldown_on_exhaustion: false,
        };
        let literal = RetryPolicyConfig {
            max_attempts: constants::LITERAL_MAX_ATTEMPTS,
            backoff: BackoffKind::Fixed,
            base_delay: Duration::from_secs_f64(constants::LITERAL_RATE_LIMIT_DELAY_SECS),
            cooldown_on_exhaustion: true,
        };

        Self {
            api: ApiConfig {
                base_url: constants::DEFAULT_API_URL.to_string(),
                model: constants::DEFAULT_MODEL.to_string(),
                analysis_temperature: constants::DEFAULT_ANALYSIS_TEMPERATURE,
                literal_temperature: constants::DEFAULT_LITERAL_TEMPERATURE,
                timeout: Duration::from_secs(constants::DEFAULT_TIMEOUT_SECS),
            },
            files: FilesConfig {
                proverbs: constants::PROVERBS_FILE.to_string(),
                cache: constants::CACHE_FILE.to_string(),
                app_data: constants::APP_DATA_FILE.to_string(),
                gold: constants::GOLD_FILE.to_string(),
            },
            retry: RetryConfig {
                courtesy_delay: Duration::from_secs_f64(constants::COURTESY_DELAY_SECS),
                retry_cached_errors: true,
                analysis,
                literal,
            },
            scraper: ScraperConfig {
                base_url: constants::SCRAPER_BASE_URL.to_string(),
                user_agent: constants::SCRAPER_USER_AGENT.to_string(),
                page_delay: Duration::from_secs_f64(constants::PAGE_DELAY_SECS),
                categories: constants::CATEGORIES.iter().map(|c| c.to_string()).collect(),
            },
            search: SearchConfig {
                limit: constants::SEARCH_LIMIT,
                threshold: constants::SEARCH_THRESHOLD,
            },
            embeddings: EmbeddingsConfig {
                url: None,
                model: constants::DEFAULT_EMBEDDING_MODEL.to_string(),
            },
            web: WebConfig {
                bind_addr: constants::DEFAULT_BIND_ADDRESS.to_string(),
                port: constants::DEFAULT_PORT,
            },
        }
    }
}

impl PipelineConfig {
    /// 加载分层配置
    ///
    /// 同时返回读取的配置文件路径（如有）。显式指定的文件不存在时报错。
    pub fn load(explicit_path: Option<&Path>) -> PipelineResult<(Self, Option<PathBuf>)> {
        load_dotenv();

        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        let config_path = match explicit_path {
            Some(path) => {
                if !path.exists() {
                    return Err(PipelineError::MissingInput(path.display().to_string()));
                }
                Some(path.to_path_buf())
            }
            None => find_config_file(),
        };

        if let Some(ref path) = config_path {
            tracing::info!(path = %path.display(), "loading config file");
            builder = builder.add_source(File::from(path.as_path()));
        }

        builder = builder.add_source(
            Environment::with_prefix("AKHAAN")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: PipelineConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        tracing::debug!(
            model = %config.api.model,
            cache = %config.files.cache,
            "configuration loaded"
        );

        Ok((config, config_path))
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if !(self.api.base_url.starts_with("http://") || self.api.base_url.starts_with("https://"))
        {
            return Err(PipelineError::Config(
                "api.base_url must start with http:// or https://".to_string(),
            ));
        }

        if self.api.model.trim().is_empty() {
            return Err(PipelineError::Config("api.model must not be empty".to_string()));
        }

        if self.retry.analysis.max_attempts == 0 || self.retry.literal.max_attempts == 0 {
            return Err(PipelineError::Config(
                "retry max_attempts must be at least 1".to_string(),
            ));
        }

        if self.scraper.categories.is_empty() {
            return Err(PipelineError::Config(
                "scraper.categories must not be empty".to_string(),
            ));
        }

        if self.search.threshold > 100 {
            return Err(PipelineError::Config(
                "search.threshold must be between 0 and 100".to_string(),
            ));
        }

        if self.search.limit == 0 {
            return Err(PipelineError::Config("search.limit must be at least 1".to_string()));
        }

        Ok(())
    }

    /// 对话补全接口地址
    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.api.base_url.trim_end_matches('/'))
    }

    /// 输出生效的配置
    pub fn to_toml(&self) -> PipelineResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn find_config_file() -> Option<PathBuf> {
    constants::CONFIG_PATHS.iter().find_map(|path| {
        let expanded = shellexpand::tilde(path);
        let candidate = Path::new(expanded.as_ref());
        candidate.exists().then(|| candidate.to_path_buf())
    })
}

/// 从找到的第一个 `.env` 文件注入进程环境变量
pub fn load_dotenv() {
    for env_file in constants::ENV_FILES {
        if Path::new(env_file).exists() {
            match dotenv::from_filename(env_file) {
                Ok(_) => {
                    tracing::debug!("loaded environment file {}", env_file);
                    break;
                }
                Err(e) => tracing::warn!("could not load environment file {}: {}", env_file, e),
            }
        }
    }
}
