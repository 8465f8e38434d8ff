//! Catalog Context - Tags

use serde::{Deserialize, Serialize};

use super::{BookId, CatalogError, TagId};

/// 标签
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

impl Tag {
    /// 规范化标签名（去除首尾空白）
    pub fn normalize_name(name: &str) -> Result<String, CatalogError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CatalogError::EmptyTagName);
        }
        Ok(name.to_string())
    }
}

/// 书与标签的多对多关联
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookTagShip {
    pub id: i64,
    pub book_id: BookId,
    pub tag_id: TagId,
}
