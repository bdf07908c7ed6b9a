//! # akhaan
//!
//! 旁遮普语谚语（akhaan）采集、释义与检索工具
//!
//! 借助托管的语言模型为谚语生成直译和解读，并支持按罗马化拼写搜索。
//!
//! ## 模块
//!
//! - `collector` - 抓取谚语列表页
//! - `analysis` - 模型直译与带缓存的分析
//! - `merge` - 合并谚语与成功的分析结果
//! - `present` - 罗马化、模糊搜索和可选的网页
//! - `eval` - 用金标准集为生成的释义打分
//! - `storage` - JSON 数据集与缓存文件
//! - `config`、`env`、`error` - 配置、密钥与错误

pub mod analysis;
pub mod collector;
pub mod config;
pub mod env;
pub mod error;
pub mod eval;
pub mod merge;
pub mod models;
pub mod network;
pub mod parsers;
pub mod present;
pub mod storage;

pub use config::PipelineConfig;
pub use error::{ErrorCategory, PipelineError, PipelineResult};
pub use models::{Analysis, AnalysisResult, GoldEntry, MergedEntry, ProverbEntry};
