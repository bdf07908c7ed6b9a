//! 数据集和缓存文件中的记录

use serde::{Deserialize, Serialize};

/// 采集到的一条谚语
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProverbEntry {
    pub id: u64,
    pub proverb_gurmukhi: String,
    #[serde(default)]
    pub literal_translation: String,
    /// 搜索时派生，不写回源文件
    #[serde(skip)]
    pub romanized_form: Option<String>,
}

impl ProverbEntry {
    pub fn new(id: u64, proverb_gurmukhi: impl Into<String>) -> Self {
        Self {
            id,
            proverb_gurmukhi: proverb_gurmukhi.into(),
            literal_translation: String::new(),
            romanized_form: None,
        }
    }

    pub fn with_literal_translation(mut self, literal_translation: impl Into<String>) -> Self {
        self.literal_translation = literal_translation.into();
        self
    }

    pub fn has_literal_translation(&self) -> bool {
        !self.literal_translation.trim().is_empty()
    }
}

/// 模型对谚语的解读
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub actual_translation: String,
    pub deeper_analysis: String,
}

/// 缓存中每条谚语的值：分析结果，或没有结果的原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    Error { error: String },
    Analysis(Analysis),
}

impl AnalysisResult {
    pub fn error(message: impl Into<String>) -> Self {
        AnalysisResult::Error {
            error: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, AnalysisResult::Error { .. })
    }

    pub fn analysis(&self) -> Option<&Analysis> {
        match self {
            AnalysisResult::Analysis(analysis) => Some(analysis),
            AnalysisResult::Error { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            AnalysisResult::Error { error } => Some(error),
            AnalysisResult::Analysis(_) => None,
        }
    }
}

impl From<Analysis> for AnalysisResult {
    fn from(analysis: Analysis) -> Self {
        AnalysisResult::Analysis(analysis)
    }
}

/// 带可用分析的谚语，即写入应用数据文件的记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedEntry {
    pub id: u64,
    pub proverb_gurmukhi: String,
    #[serde(default)]
    pub literal_translation: String,
    pub analysis: Analysis,
    #[serde(skip)]
    pub romanized_form: Option<String>,
}

impl MergedEntry {
    pub fn new(entry: ProverbEntry, analysis: Analysis) -> Self {
        Self {
            id: entry.id,
            proverb_gurmukhi: entry.proverb_gurmukhi,
            literal_translation: entry.literal_translation,
            analysis,
            romanized_form: entry.romanized_form,
        }
    }
}

/// 人工撰写的参考分析
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdealAnalysis {
    #[serde(default)]
    pub meaning: Option<String>,
}

/// 金标准评估集中的一条记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldEntry {
    pub id: u64,
    pub proverb_gurmukhi: String,
    #[serde(default)]
    pub literal_translation: String,
    #[serde(default)]
    pub ideal_analysis: Option<IdealAnalysis>,
}

impl GoldEntry {
    /// 参考释义，存在且非空时返回
    pub fn reference_meaning(&self) -> Option<&str> {
        self.ideal_analysis
            .as_ref()
            .and_then(|ideal| ideal.meaning.as_deref())
            .filter(|meaning| !meaning.trim().is_empty())
    }
}
