//! 标签派生 - 业务能力层
//!
//! 按优先级从高到低：台词 → 最多 3 位演职人员 → 描述 → 默认标签。
//! 具体内容排在通用标签前面，截断时丢掉的总是价值最低的部分。

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::split_list;
use crate::models::{AssetRecord, TagSet};

/// 参与打标签的演职人员数量上限
pub const MAX_CONTRIBUTOR_TAGS: usize = 3;

static QUOTE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Quote\[(.*?)\]").expect("valid quote marker pattern"));
static DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s!?]").expect("valid punctuation pattern"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// 为单个素材派生标签
pub fn build_tags(filename: &str, record: &AssetRecord, default_tags: &str) -> TagSet {
    let mut tags = TagSet::new();

    // 1. 台词
    let quote_tag = resolve_quote(filename, record)
        .map(|quote| sanitize_tag(&quote))
        .filter(|tag| !tag.is_empty());
    if let Some(tag) = &quote_tag {
        tags.push(tag.as_str());
    }

    // 2. 演职人员
    for name in record
        .contributor_names()
        .iter()
        .take(MAX_CONTRIBUTOR_TAGS)
    {
        tags.push(name.to_lowercase());
    }

    // 3. 描述（与台词重复时跳过）
    if let Some(desc_tag) = record.description().map(sanitize_tag) {
        let redundant = quote_tag
            .as_deref()
            .is_some_and(|quote| overlaps(quote, &desc_tag));
        if !redundant {
            tags.push(desc_tag);
        }
    }

    // 4. 默认标签
    for tag in split_list(default_tags) {
        tags.push(tag.to_lowercase());
    }

    tags
}

/// 台词：优先取元数据，其次解析文件名中的 `Quote[...]`
pub fn resolve_quote(filename: &str, record: &AssetRecord) -> Option<String> {
    record
        .quote()
        .map(str::to_string)
        .or_else(|| quote_from_filename(filename))
}

/// 解析文件名中的 `Quote[...]`，空台词视为没有
pub fn quote_from_filename(filename: &str) -> Option<String> {
    let captured = QUOTE_MARKER.captures(filename)?.get(1)?.as_str().trim();
    if captured.is_empty() {
        return None;
    }
    Some(captured.replace("\\'", "'"))
}

/// 小写、去掉除 `!` `?` 以外的标点、合并空白
///
/// 句末的 `!` `?` 不算标签内容，一并去掉。
pub fn sanitize_tag(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = DISALLOWED.replace_all(&lowered, "");
    let collapsed = WHITESPACE.replace_all(stripped.trim(), " ");
    collapsed
        .trim_end_matches(|c: char| c == '!' || c == '?' || c.is_whitespace())
        .to_string()
}

/// 两个短语相同，或其中一个以整词形式包含另一个
fn overlaps(a: &str, b: &str) -> bool {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return false;
    }
    format!(" {} ", long).contains(&format!(" {} ", short))
}
