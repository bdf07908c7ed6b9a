//! 古木基文到 IAST 的罗马化
//!
//! 查表实现。辅音自带 `a`，后接元音符号或 virama 时除外。Addak 重复下一个辅音的首字母，
//! bindi 和 tippi 写作 `ṃ`。表外字符原样保留。

/// 转写为可搜索的拉丁字母形式
pub trait Transliterator {
    fn transliterate(&self, text: &str) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GurmukhiIast;

const VIRAMA: char = '\u{0A4D}';
const NUKTA: char = '\u{0A3C}';
const ADDAK: char = '\u{0A71}';

fn consonant(c: char) -> Option<&'static str> {
    let latin = match c {
        'ਕ' => "k",
        'ਖ' => "kh",
        'ਗ' => "g",
        'ਘ' => "gh",
        'ਙ' => "ṅ",
        'ਚ' => "c",
        'ਛ' => "ch",
        'ਜ' => "j",
        'ਝ' => "jh",
        'ਞ' => "ñ",
        'ਟ' => "ṭ",
        'ਠ' => "ṭh",
        'ਡ' => "ḍ",
        'ਢ' => "ḍh",
        'ਣ' => "ṇ",
        'ਤ' => "t",
        'ਥ' => "th",
        'ਦ' => "d",
        'ਧ' => "dh",
        'ਨ' => "n",
        'ਪ' => "p",
        'ਫ' => "ph",
        'ਬ' => "b",
        'ਭ' => "bh",
        'ਮ' => "m",
        'ਯ' => "y",
        'ਰ' => "r",
        'ਲ' => "l",
        'ਵ' => "v",
        'ੜ' => "ṛ",
        'ਸ' => "s",
        'ਹ' => "h",
        // 预组合的 nukta 字母
        '\u{0A36}' => "ś",
        '\u{0A59}' => "k͟h",
        '\u{0A5A}' => "ġ",
        '\u{0A5B}' => "z",
        '\u{0A5E}' => "f",
        '\u{0A33}' => "ḷ",
        _ => return None,
    };
    Some(latin)
}

/// 基础字母后跟独立的 nukta 符号
fn nukta_form(c: char) -> Option<&'static str> {
    match c {
        'ਸ' => Some("ś"),
        'ਖ' => Some("k͟h"),
        'ਗ' => Some("ġ"),
        'ਜ' => Some("z"),
        'ਫ' => Some("f"),
        'ਲ' => Some("ḷ"),
        _ => None,
    }
}

fn vowel_sign(c: char) -> Option<&'static str> {
    match c {
        'ਾ' => Some("ā"),
        'ਿ' => Some("i"),
        'ੀ' => Some("ī"),
        'ੁ' => Some("u"),
        'ੂ' => Some("ū"),
        'ੇ' => Some("e"),
        'ੈ' => Some("ai"),
        'ੋ' => Some("o"),
        'ੌ' => Some("au"),
        _ => None,
    }
}

fn independent_vowel(c: char) -> Option<&'static str> {
    match c {
        'ਅ' => Some("a"),
        'ਆ' => Some("ā"),
        'ਇ' => Some("i"),
        'ਈ' => Some("ī"),
        'ਉ' => Some("u"),
        'ਊ' => Some("ū"),
        'ਏ' => Some("e"),
        'ਐ' => Some("ai"),
        'ਓ' => Some("o"),
        'ਔ' => Some("au"),
        _ => None,
    }
}

/// 元音载体（ੳ、ੲ）取其所附符号的读音
fn bearer_default(c: char) -> Option<&'static str> {
    match c {
        'ੳ' => Some("u"),
        'ੲ' => Some("i"),
        _ => None,
    }
}

fn other_sign(c: char) -> Option<&'static str> {
    match c {
        'ਂ' | 'ੰ' => Some("ṃ"),
        'ਃ' => Some("ḥ"),
        '।' => Some("."),
        '॥' => Some(".."),
        '੦' => Some("0"),
        '੧' => Some("1"),
        '੨' => Some("2"),
        '੩' => Some("3"),
        '੪' => Some("4"),
        '੫' => Some("5"),
        '੬' => Some("6"),
        '੭' => Some("7"),
        '੮' => Some("8"),
        '੯' => Some("9"),
        _ => None,
    }
}

/// 从 `chars[index]` 开始的辅音及其占用的字符数
fn read_consonant(chars: &[char], index: usize) -> Option<(&'static str, usize)> {
    let c = *chars.get(index)?;
    if chars.get(index + 1) == Some(&NUKTA) {
        if let Some(latin) = nukta_form(c) {
            return Some((latin, 2));
        }
    }
    consonant(c).map(|latin| {
        let width = if chars.get(index + 1) == Some(&NUKTA) { 2 } else { 1 };
        (latin, width)
    })
}

impl Transliterator for GurmukhiIast {
    fn transliterate(&self, text: &str) -> String {
        let chars: Vec<char> = text.chars().collect();
        let mut out = String::with_capacity(text.len());
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];

            if let Some((latin, width)) = read_consonant(&chars, i) {
                out.push_str(latin);
                i += width;
                match chars.get(i) {
                    Some(&VIRAMA) => i += 1,
                    Some(&next) => match vowel_sign(next) {
                        Some(sign) => {
                            out.push_str(sign);
                            i += 1;
                        }
                        None => out.push('a'),
                    },
                    None => out.push('a'),
                }
                continue;
            }

            if c == ADDAK {
                if let Some((latin, _)) = read_consonant(&chars, i + 1) {
                    if let Some(first) = latin.chars().next() {
                        out.push(first);
                    }
                }
                i += 1;
                continue;
            }

            if let Some(default) = bearer_default(c) {
                match chars.get(i + 1).and_then(|&next| vowel_sign(next)) {
                    Some(sign) => {
                        out.push_str(sign);
                        i += 2;
                    }
                    None => {
                        out.push_str(default);
                        i += 1;
                    }
                }
                continue;
            }

            if let Some(latin) = independent_vowel(c)
                .or_else(|| vowel_sign(c))
                .or_else(|| other_sign(c))
            {
                out.push_str(latin);
            } else if c != VIRAMA && c != NUKTA {
                out.push(c);
            }
            i += 1;
        }

        out
    }
}
