//! Catalog Context - Aggregate Root

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, CatalogError, ResolutionState};

/// 书名最大长度（字符）
pub const BOOK_NAME_MAX_CHARS: usize = 255;

/// 校验书名（自然键）
pub fn validate_book_name(name: &str) -> Result<(), CatalogError> {
    if name.trim().is_empty() {
        return Err(CatalogError::EmptyBookName);
    }
    let chars = name.chars().count();
    if chars > BOOK_NAME_MAX_CHARS {
        return Err(CatalogError::BookNameTooLong(chars));
    }
    Ok(())
}

/// Book 聚合根
///
/// 不变量:
/// - `name` 全局唯一
/// - 字符串字段以空串表示「未设置」
/// - `src_name` 为空表示没有外部来源，懒加载为空操作
/// - `lock` 只是约定，由调用方自行检查
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub name: String,
    pub is_over: bool,
    pub author: String,
    pub description: String,
    pub score: i64,
    pub lock: bool,
    pub src_name: String,
    pub src_id: String,
    pub src_url: String,
    /// 更新策略引用（不透明）
    pub strategy_id: Option<i64>,
    /// 章节列表的懒加载状态
    pub chapters_state: ResolutionState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// 元数据是否需要从来源补全
    ///
    /// author、description、score 全部为「假值」时才需要
    pub fn needs_detail(&self) -> bool {
        self.author.is_empty() && self.description.is_empty() && self.score == 0
    }

    /// 是否配置了外部来源
    pub fn has_source(&self) -> bool {
        !self.src_name.is_empty()
    }

    /// 用来源返回的元数据覆盖本地字段
    pub fn apply_detail(&mut self, detail: &BookDetail) {
        self.author = detail.author.clone();
        self.description = detail.description.clone();
        self.score = detail.score;
        if let Some(is_over) = detail.is_over {
            self.is_over = is_over;
        }
        self.updated_at = Utc::now();
    }

    pub fn set_chapters_state(&mut self, state: ResolutionState) {
        self.chapters_state = state;
        self.updated_at = Utc::now();
    }
}

impl std::fmt::Display for Book {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// 来源提供的书籍元数据
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDetail {
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub is_over: Option<bool>,
}

/// 待创建的书籍
///
/// `name` 之外的字段都有默认值，对应 get-or-create 的可选参数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewBook {
    pub name: String,
    pub is_over: bool,
    pub author: String,
    pub description: String,
    pub score: i64,
    pub lock: bool,
    pub src_name: String,
    pub src_id: String,
    pub src_url: String,
    pub strategy_id: Option<i64>,
}

impl NewBook {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_source(
        mut self,
        src_name: impl Into<String>,
        src_id: impl Into<String>,
        src_url: impl Into<String>,
    ) -> Self {
        self.src_name = src_name.into();
        self.src_id = src_id.into();
        self.src_url = src_url.into();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_score(mut self, score: i64) -> Self {
        self.score = score;
        self
    }

    pub fn locked(mut self, lock: bool) -> Self {
        self.lock = lock;
        self
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        validate_book_name(&self.name)
    }

    /// 赋予主键，得到持久化后的实体
    pub fn into_book(self, id: BookId, now: DateTime<Utc>) -> Book {
        Book {
            id,
            name: self.name,
            is_over: self.is_over,
            author: self.author,
            description: self.description,
            score: self.score,
            lock: self.lock,
            src_name: self.src_name,
            src_id: self.src_id,
            src_url: self.src_url,
            strategy_id: self.strategy_id,
            chapters_state: ResolutionState::Unresolved,
            created_at: now,
            updated_at: now,
        }
    }
}
