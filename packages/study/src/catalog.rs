//! 词表目录
//!
//! 按等级提供内置的汉字词表。数据在构建时嵌入，加载是纯函数：
//! 同一等级总是返回同一顺序的同一词表。

use kanji_algo::{JlptLevel, KanjiWord};

/// 未识别等级代码时的兜底等级
pub const DEFAULT_LEVEL: JlptLevel = JlptLevel::N4;

const KANJI_N4: &str = include_str!("data/kanji_n4.json");
const KANJI_N3: &str = include_str!("data/kanji_n3.json");
const KANJI_N2: &str = include_str!("data/kanji_n2.json");

/// 解析内置词表。数据随二进制打包，解析失败属于构建错误，
/// 返回空表并记录日志而不是 panic。
fn parse_words(raw: &str) -> Vec<KanjiWord> {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        log::error!("embedded word list is malformed: {e}");
        Vec::new()
    })
}

/// 加载指定等级的全部单词。
///
/// `All` 返回所有等级按 N4 → N3 → N2 顺序拼接的词表。
pub fn load_words(level: JlptLevel) -> Vec<KanjiWord> {
    match level {
        JlptLevel::N4 => parse_words(KANJI_N4),
        JlptLevel::N3 => parse_words(KANJI_N3),
        JlptLevel::N2 => parse_words(KANJI_N2),
        JlptLevel::All => {
            let mut all = parse_words(KANJI_N4);
            all.extend(parse_words(KANJI_N3));
            all.extend(parse_words(KANJI_N2));
            all
        }
    }
}

/// 按字符串等级代码加载词表。
///
/// 未识别的代码回退到 [`DEFAULT_LEVEL`]，绝不失败。
pub fn load_words_for_code(code: &str) -> Vec<KanjiWord> {
    match JlptLevel::from_code(code) {
        Some(level) => load_words(level),
        None => {
            log::warn!("unknown level code {code:?}, falling back to {DEFAULT_LEVEL}");
            load_words(DEFAULT_LEVEL)
        }
    }
}

/// 指定等级的单词总数
pub fn total_word_count(level: JlptLevel) -> usize {
    load_words(level).len()
}
