//! 近似字符串打分
//!
//! 分值范围 0 到 100。[`ratio`] 为归一化的 indel 相似度（`2 * LCS / (len_a + len_b)`）；
//! [`weighted_ratio`] 再结合局部匹配和按词匹配的变体，长度差异大时按比例压低。

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

fn non_word() -> Option<&'static Regex> {
    static NON_WORD: OnceLock<Option<Regex>> = OnceLock::new();
    NON_WORD.get_or_init(|| Regex::new(r"\W").ok()).as_ref()
}

/// 转小写，非单词字符替换为空格，再去掉首尾空白
pub fn default_process(text: &str) -> String {
    let lowered = text.to_lowercase();
    let replaced = match non_word() {
        Some(re) => re.replace_all(&lowered, " ").into_owned(),
        None => lowered
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
            .collect(),
    };
    replaced.trim().to_string()
}

/// 最长公共子序列长度
pub fn lcs_len<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];

    for x in a {
        for (j, y) in b.iter().enumerate() {
            current[j + 1] = if x == y {
                previous[j] + 1
            } else {
                current[j].max(previous[j + 1])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

fn char_ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(a, b) as f64 / total as f64
}

pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    char_ratio(&a, &b)
}

/// 较短串与较长串任意等长窗口的最佳 [`ratio`]，包括两端被截断的窗口
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    if short.is_empty() {
        return if long.is_empty() { 100.0 } else { 0.0 };
    }

    let m = short.len();
    let n = long.len();
    let mut best: f64 = 0.0;

    for width in 1..m {
        best = best.max(char_ratio(&short, &long[..width]));
        best = best.max(char_ratio(&short, &long[n - width..]));
    }
    for start in 0..=(n - m) {
        best = best.max(char_ratio(&short, &long[start..start + m]));
        if best >= 100.0 {
            break;
        }
    }

    best
}

fn sorted_tokens(text: &str) -> String {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

fn token_set_with(a: &str, b: &str, scorer: fn(&str, &str) -> f64) -> f64 {
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let join = |set: Vec<&&str>| set.into_iter().copied().collect::<Vec<_>>().join(" ");
    let intersection = join(tokens_a.intersection(&tokens_b).collect());
    let only_a = join(tokens_a.difference(&tokens_b).collect());
    let only_b = join(tokens_b.difference(&tokens_a).collect());

    let combined_a = format!("{intersection} {only_a}").trim().to_string();
    let combined_b = format!("{intersection} {only_b}").trim().to_string();

    let mut best = scorer(&combined_a, &combined_b);
    if !intersection.is_empty() {
        best = best
            .max(scorer(&intersection, &combined_a))
            .max(scorer(&intersection, &combined_b));
    }
    best
}

pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    token_set_with(a, b, ratio)
}

pub fn partial_token_sort_ratio(a: &str, b: &str) -> f64 {
    partial_ratio(&sorted_tokens(a), &sorted_tokens(b))
}

pub fn partial_token_set_ratio(a: &str, b: &str) -> f64 {
    token_set_with(a, b, partial_ratio)
}

const UNBASE_SCALE: f64 = 0.95;

/// 上述打分的加权组合，输入先经过预处理
pub fn weighted_ratio(a: &str, b: &str) -> u8 {
    let a = default_process(a);
    let b = default_process(b);
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let len_a = a.chars().count() as f64;
    let len_b = b.chars().count() as f64;
    let length_ratio = len_a.max(len_b) / len_a.min(len_b);

    let base = ratio(&a, &b);

    let best = if length_ratio < 1.5 {
        base.max(token_sort_ratio(&a, &b) * UNBASE_SCALE)
            .max(token_set_ratio(&a, &b) * UNBASE_SCALE)
    } else {
        let partial_scale = if length_ratio < 8.0 { 0.9 } else { 0.6 };
        base.max(partial_ratio(&a, &b) * partial_scale)
            .max(partial_token_sort_ratio(&a, &b) * UNBASE_SCALE * partial_scale)
            .max(partial_token_set_ratio(&a, &b) * UNBASE_SCALE * partial_scale)
    };

    best.round().clamp(0.0, 100.0) as u8
}

/// 按 [`weighted_ratio`] 取前 `limit` 个候选，高分在前；同分保持输入顺序
pub fn extract<'a, S: AsRef<str>>(query: &str, choices: &'a [S], limit: usize) -> Vec<(&'a str, u8)> {
    let mut scored: Vec<(usize, &'a str, u8)> = choices
        .iter()
        .enumerate()
        .map(|(index, choice)| {
            let choice = choice.as_ref();
            (index, choice, weighted_ratio(query, choice))
        })
        .collect();

    scored.sort_by(|x, y| y.2.cmp(&x.2).then(x.0.cmp(&y.0)));
    scored
        .into_iter()
        .take(limit)
        .map(|(_, choice, score)| (choice, score))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_process() {
        assert_eq!(default_process("  Uccī, Dukāna! "), "uccī  dukāna");
    }

    #[test]
    fn test_ratio_bounds() {
        assert_eq!(ratio("dukāna", "dukāna"), 100.0);
        assert_eq!(ratio("abc", "xyz"), 0.0);
        assert_eq!(ratio("", ""), 100.0);
    }

    #[test]
    fn test_partial_ratio_finds_substring() {
        assert_eq!(partial_ratio("dukāna", "uccī dukāna phikkā"), 100.0);
    }

    #[test]
    fn test_token_ratios_ignore_order() {
        assert_eq!(token_sort_ratio("dukāna uccī", "uccī dukāna"), 100.0);
        assert_eq!(token_set_ratio("uccī uccī dukāna", "dukāna uccī"), 100.0);
    }

    #[test]
    fn test_weighted_ratio_for_romanized_query() {
        let score = weighted_ratio("uchi dukan", "uccī dukāna phikkā pakavāna");
        assert!(score > 50, "score was {score}");
        assert_eq!(weighted_ratio("", "anything"), 0);
    }

    #[test]
    fn test_extract_orders_by_score() {
        let choices = vec![
            "ghara dā bhetī laṃkā ḍhāhe",
            "uccī dukāna phikkā pakavāna",
            "ujaṛe bāgāṃ de gālhaṛa paṭavārī",
        ];
        let results = extract("uchi dukan", &choices, 3);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0, "uccī dukāna phikkā pakavāna");
    }
}
