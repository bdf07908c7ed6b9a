//! 提示词模板
//!
//! 分析提示词带两个示例；直译提示词只要求逐词直译。

use crate::analysis::client::{ChatMessage, ChatRequest};
use crate::error::{PipelineError, PipelineResult};
use crate::models::Analysis;

pub const ANALYSIS_SYSTEM_PROMPT: &str = "You are a wise native speaker explaining Punjabi proverbs to a friend. Your task is to produce a clear analysis in a valid JSON object.

Your entire response must be ONLY the JSON object, with no extra text or markdown.

The JSON must contain two keys:
1. \"actual_translation\": Provide the simple, direct meaning of the proverb as it is used in everyday conversation. Explain it clearly and concisely, like you would to a friend.
2. \"deeper_analysis\": Here, you can provide a more detailed paragraph explaining the key symbols, cultural context, and an example of its use.
";

pub const LITERAL_SYSTEM_PROMPT: &str = "You are a Punjabi language translator. Translate the following proverb word-for-word from Gurmukhi to English. Do not interpret or explain. Just give the literal translation.";

/// 供模型模仿的谚语及其分析
#[derive(Debug, Clone, Copy)]
pub struct WorkedExample {
    pub proverb_gurmukhi: &'static str,
    pub literal_translation: &'static str,
    pub actual_translation: &'static str,
    pub deeper_analysis: &'static str,
}

impl WorkedExample {
    pub fn analysis(&self) -> Analysis {
        Analysis {
            actual_translation: self.actual_translation.to_string(),
            deeper_analysis: self.deeper_analysis.to_string(),
        }
    }

    /// 原样展示给模型的示例答案
    pub fn analysis_json(&self) -> String {
        serde_json::to_string_pretty(&self.analysis()).unwrap_or_default()
    }
}

pub const WORKED_EXAMPLES: [WorkedExample; 2] = [
    WorkedExample {
        proverb_gurmukhi: "ਉਜੜੇ ਬਾਗਾਂ ਦੇ ਗਾਲ੍ਹੜ ਪਟਵਾਰੀ",
        literal_translation: "Of the deserted gardens, squirrels are the land-record keepers",
        actual_translation: "It means that when things fall apart, useless or unqualified people take charge.",
        deeper_analysis: "The proverb powerfully contrasts an important official, the 'Patwari' (land-record keeper), with a common squirrel ('galhaṛ'). It's used to criticize situations where a skilled leader leaves and an incompetent person takes over, creating chaos. For example, if a great project manager quits and their unqualified assistant is promoted, leading to disaster.",
    },
    WorkedExample {
        proverb_gurmukhi: "ਉੱਚੀ ਦੁਕਾਨ ਫਿੱਕਾ ਪਕਵਾਨ",
        literal_translation: "High shop, bland dish",
        actual_translation: "This simply means something looks great on the outside but is disappointing in quality on the inside.",
        deeper_analysis: "The 'high shop' is a metaphor for anything with a fancy appearance or great marketing, while the 'bland dish' represents the poor quality underneath. People use this all the time for things like a beautiful restaurant that serves bad food, or a movie with amazing trailers that turns out to be boring.",
    },
];

const REQUIRED_FORMAT: &str = "{
  \"actual_translation\": \"The simple, direct meaning for everyday use.\",
  \"deeper_analysis\": \"The detailed explanation with symbols and a usage example.\"
}";

fn few_shot_block() -> String {
    let mut block = String::from("\n---\n");
    for (index, example) in WORKED_EXAMPLES.iter().enumerate() {
        block.push_str(&format!(
            "**EXAMPLE {}**\n\n**Proverb (Gurmukhi):** \"{}\"\n**Literal Translation:** \"{}\"\n\n**Analysis JSON:**\n{}\n---\n",
            index + 1,
            example.proverb_gurmukhi,
            example.literal_translation,
            example.analysis_json()
        ));
    }
    block
}

/// 分析调用的用户消息
pub fn analysis_user_prompt(proverb_gurmukhi: &str, literal_translation: &str) -> String {
    format!(
        "\n{}\n**TASK**\n\n**Proverb (Gurmukhi):** \"{}\"\n**Literal Translation:** \"{}\"\n\n**Required JSON Format:**\n{}\n",
        few_shot_block(),
        proverb_gurmukhi,
        literal_translation,
        REQUIRED_FORMAT
    )
}

pub fn analysis_request(
    proverb_gurmukhi: &str,
    literal_translation: &str,
    temperature: f32,
) -> ChatRequest {
    ChatRequest {
        messages: vec![
            ChatMessage::system(ANALYSIS_SYSTEM_PROMPT),
            ChatMessage::user(analysis_user_prompt(proverb_gurmukhi, literal_translation)),
        ],
        temperature,
        json_response: true,
    }
}

pub fn literal_request(proverb_gurmukhi: &str, temperature: f32) -> ChatRequest {
    ChatRequest {
        messages: vec![
            ChatMessage::system(LITERAL_SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Proverb: \"{proverb_gurmukhi}\"\nLiteral Translation:"
            )),
        ],
        temperature,
        json_response: false,
    }
}

/// 解析模型返回的 JSON 答案
pub fn parse_analysis(response: &str) -> PipelineResult<Analysis> {
    serde_json::from_str(response.trim())
        .map_err(|e| PipelineError::Parse(format!("model response is not the expected JSON: {e}")))
}
