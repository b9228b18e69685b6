use std::fmt;

use patterns_core::shape::SerializedShape;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// 服务器分配的模式标识。服务器可能以字符串或数字返回。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PatternId(String);

impl PatternId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PatternId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => PatternId(text),
            Raw::Number(number) => PatternId(number.to_string()),
        })
    }
}

/// 模式面板树节点的标识，用于把模式与界面节点对应起来。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeNodeId(pub u64);

/// 线上传输的模式记录 `{id, name, serPattern, imageUrl}`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PatternId>,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "ser_pattern_from_text_or_array")]
    pub ser_pattern: Vec<SerializedShape>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// `serPattern` 可能是数组，也可能是包含数组的 JSON 文本。
fn ser_pattern_from_text_or_array<'de, D>(deserializer: D) -> Result<Vec<SerializedShape>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Shapes(Vec<SerializedShape>),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(Vec::new()),
        Some(Raw::Shapes(shapes)) => Ok(shapes),
        Some(Raw::Text(text)) if text.trim().is_empty() => Ok(Vec::new()),
        Some(Raw::Text(text)) => serde_json::from_str(&text).map_err(D::Error::custom),
    }
}

/// 一个具名、可复用的形状子图。
///
/// 刚从选区捕获的模式没有 `id`；从服务器加载或新增成功后才有。
/// `repository` 记录所属仓库的命名空间，只有归属仓库的模式才能被改名或删除。
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub id: Option<PatternId>,
    pub name: String,
    pub image_url: Option<String>,
    pub ser_pattern: Vec<SerializedShape>,
    pub tree_node: Option<TreeNodeId>,
    repository: Option<String>,
}

impl Pattern {
    pub fn new(name: impl Into<String>, ser_pattern: Vec<SerializedShape>) -> Self {
        Self {
            id: None,
            name: name.into(),
            image_url: None,
            ser_pattern,
            tree_node: None,
            repository: None,
        }
    }

    pub fn from_record(record: PatternRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            image_url: record.image_url,
            ser_pattern: record.ser_pattern,
            tree_node: None,
            repository: None,
        }
    }

    pub fn to_record(&self) -> PatternRecord {
        PatternRecord {
            id: self.id.clone(),
            name: self.name.clone(),
            ser_pattern: self.ser_pattern.clone(),
            image_url: self.image_url.clone(),
        }
    }

    /// 只包含 `id`、`name`、`serPattern`、`imageUrl` 的 JSON 文本。
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_record())
    }

    /// 拖拽时携带的载荷：序列化后的形状数组。
    pub fn drag_payload(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.ser_pattern)
    }

    #[inline]
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn repository(&self) -> Option<&str> {
        self.repository.as_deref()
    }

    pub(crate) fn attach(&mut self, namespace: &str) {
        self.repository = Some(namespace.to_string());
    }
}
