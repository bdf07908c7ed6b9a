//! 远程文本生成
//!
//! 包含客户端、提示词、重试策略，以及使用它们的两处调用：分析和直译。

pub mod analyzer;
pub mod client;
pub mod filler;
pub mod prompt;
pub mod retry;

pub use analyzer::{Analyzer, AnalyzerOptions, AnalyzerStats, BatchSummary};
pub use client::{ChatClient, ChatMessage, ChatRequest, GroqClient};
pub use filler::{FillReport, LiteralFiller};
pub use retry::{Backoff, RetryError, RetryPolicy, Sleeper, ThreadSleeper};
