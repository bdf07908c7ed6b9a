//! 展示层：罗马化、模糊匹配与搜索入口

pub mod fuzzy;
pub mod search;
pub mod transliterate;
#[cfg(feature = "web")]
pub mod web;

pub use search::{ProverbIndex, Romanizer, SearchHit};
pub use transliterate::{GurmukhiIast, Transliterator};
