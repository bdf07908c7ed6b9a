//! 基于小写字母数字词元的 ROUGE-L

use std::sync::OnceLock;

use regex::Regex;

use crate::present::fuzzy::lcs_len;

fn separator() -> Option<&'static Regex> {
    static SEPARATOR: OnceLock<Option<Regex>> = OnceLock::new();
    SEPARATOR.get_or_init(|| Regex::new(r"[^a-z0-9]+").ok()).as_ref()
}

/// 小写后的 `[a-z0-9]` 连续串，逐个经过 [`stem`]
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = match separator() {
        Some(re) => re.split(&lowered).collect(),
        None => lowered
            .split(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit()))
            .collect(),
    };

    tokens
        .into_iter()
        .filter(|token| !token.is_empty())
        .map(stem)
        .collect()
}

fn has_vowel(text: &str) -> bool {
    text.chars().any(|c| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y'))
}

/// 去掉常见英文词形变化，让 "fancier shops" 与 "fancy shop" 有相同词元。短词不处理。
pub fn stem(token: &str) -> String {
    if token.len() <= 3 {
        return token.to_string();
    }

    let mut word = token.to_string();

    if let Some(base) = word.strip_suffix("sses") {
        word = format!("{base}ss");
    } else if let Some(base) = word.strip_suffix("ies") {
        word = format!("{base}y");
    } else if !word.ends_with("ss") && !word.ends_with("us") {
        if let Some(base) = word.strip_suffix('s') {
            word = base.to_string();
        }
    }

    for suffix in ["ingly", "edly", "ing", "ed", "ly", "er"] {
        if let Some(base) = word.strip_suffix(suffix) {
            if base.len() >= 3 && has_vowel(base) {
                word = base.to_string();
                break;
            }
        }
    }

    word
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RougeScore {
    pub precision: f64,
    pub recall: f64,
    pub fmeasure: f64,
}

/// 以 `reference` 为参考为 `candidate` 打分
pub fn rouge_l(reference: &str, candidate: &str) -> RougeScore {
    let reference = tokenize(reference);
    let candidate = tokenize(candidate);

    let lcs = lcs_len(&reference, &candidate) as f64;
    if lcs == 0.0 {
        return RougeScore {
            precision: 0.0,
            recall: 0.0,
            fmeasure: 0.0,
        };
    }

    let precision = lcs / candidate.len() as f64;
    let recall = lcs / reference.len() as f64;
    RougeScore {
        precision,
        recall,
        fmeasure: 2.0 * precision * recall / (precision + recall),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_and_splits() {
        assert_eq!(
            tokenize("Looks GREAT, but it's bland!"),
            vec!["look", "great", "but", "it", "s", "bland"]
        );
    }

    #[test]
    fn test_stem_rules() {
        assert_eq!(stem("shops"), "shop");
        assert_eq!(stem("stories"), "story");
        assert_eq!(stem("classes"), "class");
        assert_eq!(stem("looking"), "look");
        assert_eq!(stem("bus"), "bus");
        assert_eq!(stem("glass"), "glass");
    }

    #[test]
    fn test_identical_texts_score_one() {
        let score = rouge_l("a fancy shop", "a fancy shop");
        assert!((score.fmeasure - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_overlap() {
        // lcs("the cat sat", "the cat ran") = 2, precision = recall = 2/3
        let score = rouge_l("the cat sat", "the cat ran");
        assert!((score.fmeasure - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_texts_score_zero() {
        assert_eq!(rouge_l("alpha", "omega").fmeasure, 0.0);
        assert_eq!(rouge_l("", "omega").fmeasure, 0.0);
    }
}
