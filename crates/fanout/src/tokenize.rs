// tokenize.rs
// 分词器，用正则把文本切分为单词，保留英文缩写中的撇号（如 don't）。
use once_cell::sync::Lazy;
use regex::Regex;

static WORD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\w+(?:'\w+)?\b|\w+").expect("invalid word pattern"));

/// 把文本切分为单词，返回的切片借用自原文本
pub fn split_words(text: &str) -> Vec<&str> {
    WORD_PATTERN.find_iter(text).map(|m| m.as_str()).collect()
}
