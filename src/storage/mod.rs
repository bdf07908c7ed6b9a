//! # 存储模块
//!
//! 扁平 JSON 文件，每次整体重写：
//!
//! - `cache` - 谚语原文到分析结果
//! - `dataset` - 谚语列表、合并后的应用数据和金标准集

pub mod cache;
pub mod dataset;

pub use cache::CacheStore;
pub use dataset::{read_json_file, write_json_file};
