use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// 文件名 → 素材记录
pub type Metadata = BTreeMap<String, AssetRecord>;

const QUOTE_KEY: &str = "quote";
const DESCRIPTION_KEY: &str = "description";
const CONTRIBUTORS_KEY: &str = "actors";
const PUBLISHED_KEY: &str = "giphy_uploaded";

/// 单个素材的元数据记录
///
/// 记录按读入时的 JSON 原样保存，只在读取时按需解释各字段：
/// 类型不符的字段被当作缺失，但写回时保持不变（包括 `null`）。
/// 这样一个手工写错的字段不会让整个元数据文件被当作损坏。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRecord {
    raw: JsonValue,
}

impl Default for AssetRecord {
    fn default() -> Self {
        Self {
            raw: JsonValue::Object(Map::new()),
        }
    }
}

impl AssetRecord {
    /// 原始字段
    pub fn field(&self, key: &str) -> Option<&JsonValue> {
        self.raw.get(key)
    }

    /// 是否已发布
    ///
    /// 按 JSON 真值判断：`true`、非零数字、非空字符串、数组和对象都算已发布。
    pub fn is_published(&self) -> bool {
        self.field(PUBLISHED_KEY).is_some_and(is_truthy)
    }

    /// 标记为已发布（只置位，从不清除）
    ///
    /// 记录本身不是对象时无法附加字段，整条替换为只含发布标记的对象。
    pub fn mark_published(&mut self) {
        if !self.raw.is_object() {
            self.raw = JsonValue::Object(Map::new());
        }
        if let Some(fields) = self.raw.as_object_mut() {
            fields.insert(PUBLISHED_KEY.to_string(), JsonValue::Bool(true));
        }
    }

    /// 非空的台词
    pub fn quote(&self) -> Option<&str> {
        self.text(QUOTE_KEY)
    }

    /// 非空的描述
    pub fn description(&self) -> Option<&str> {
        self.text(DESCRIPTION_KEY)
    }

    /// 演职人员列表（保持原有顺序）
    ///
    /// 历史文件里既有逗号拼接的字符串，也有字符串数组。
    pub fn contributor_names(&self) -> Vec<String> {
        let names: Vec<&str> = match self.field(CONTRIBUTORS_KEY) {
            Some(JsonValue::String(joined)) => joined.split(',').collect(),
            Some(JsonValue::Array(list)) => list.iter().filter_map(JsonValue::as_str).collect(),
            _ => Vec::new(),
        };

        names
            .into_iter()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.field(key)
            .and_then(JsonValue::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(_) | JsonValue::Object(_) => true,
    }
}
