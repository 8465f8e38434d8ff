//! Source Port - 外部书源抽象
//!
//! 每个书源（provider）一个实现，在启动时注册到 `SourceFactory`，
//! 注册名与 `Book::src_name` 一致。
//!
//! 适配器只负责拉取和解析，返回数据；写入实体和持久化由懒加载编排器完成，
//! 因此适配器失败时已持久化的数据保持不变。

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

use crate::domain::catalog::{Book, BookDetail, BookId, Chapter, NewChapter};

/// 书源拉取错误
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error (HTTP {status}): {message}")]
    ServiceError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No data from source: {0}")]
    NoData(String),

    #[error("Missing source identifier: {0}")]
    MissingIdentifier(String),
}

impl SourceError {
    /// 重试是否可能成功
    pub fn is_retryable(&self) -> bool {
        match self {
            SourceError::NetworkError(_) | SourceError::Timeout => true,
            SourceError::ServiceError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// 来源章节列表中的一项
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChapterEntry {
    /// 来源给出的章节号；缺省时使用列表中的位置（从 1 开始）
    #[serde(default)]
    pub number: Option<i32>,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "url")]
    pub src_url: String,
    /// 部分来源在目录中直接附带正文
    #[serde(default)]
    pub content: String,
}

impl ChapterEntry {
    pub fn into_new_chapter(self, book_id: BookId, number: i32) -> NewChapter {
        NewChapter::new(book_id, number)
            .with_title(self.title)
            .with_src_url(self.src_url)
            .with_content(self.content)
    }
}

/// 列表位置（从 0 开始）对应的缺省章节号
pub fn position_number(position: usize) -> i32 {
    i32::try_from(position + 1).unwrap_or(i32::MAX)
}

/// 为来源目录分配章节号，结果与 `entries` 一一对应
///
/// 显式章节号原样保留，重复时返回 `InvalidResponse`；
/// 缺省章节号取位置序号，被占用时顺延到下一个空闲号。
pub fn assign_numbers(entries: &[ChapterEntry]) -> Result<Vec<i32>, SourceError> {
    let mut taken = HashSet::new();
    for number in entries.iter().filter_map(|e| e.number) {
        if !taken.insert(number) {
            return Err(SourceError::InvalidResponse(format!(
                "duplicate chapter number {} in listing",
                number
            )));
        }
    }

    let mut numbers = Vec::with_capacity(entries.len());
    for (position, entry) in entries.iter().enumerate() {
        let number = match entry.number {
            Some(number) => number,
            None => {
                let mut candidate = position_number(position);
                while taken.contains(&candidate) {
                    candidate = candidate.checked_add(1).ok_or_else(|| {
                        SourceError::InvalidResponse("chapter number overflow".to_string())
                    })?;
                }
                taken.insert(candidate);
                candidate
            }
        };
        numbers.push(number);
    }
    Ok(numbers)
}

/// Source Port
#[async_trait]
pub trait SourcePort: Send + Sync {
    /// 拉取书籍元数据（作者、简介、评分等），以 `src_id` / `src_url` 定位
    async fn get_book_detail(&self, book: &Book) -> Result<BookDetail, SourceError>;

    /// 拉取完整章节列表，保持来源顺序
    async fn get_chapters(&self, book: &Book) -> Result<Vec<ChapterEntry>, SourceError>;

    /// 拉取单章正文，以 `chapter.src_url` 定位
    async fn get_chapter_content(
        &self,
        book: &Book,
        chapter: &Chapter,
    ) -> Result<String, SourceError>;

    /// 检查书源是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(number: Option<i32>, title: &str) -> ChapterEntry {
        ChapterEntry {
            number,
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_numbers_fall_back_to_position() {
        let entries = vec![entry(None, "第一章"), entry(Some(10), "第十章"), entry(None, "")];
        assert_eq!(assign_numbers(&entries).unwrap(), vec![1, 10, 3]);

        let chapter = entries[0].clone().into_new_chapter(BookId::new(1), 1);
        assert_eq!(chapter.number, 1);
        assert_eq!(chapter.title, "第一章");
    }

    #[test]
    fn test_position_numbers_skip_explicit_ones() {
        let entries = vec![
            entry(None, "序章"),
            entry(Some(1), "第一章"),
            entry(Some(2), "第二章"),
        ];
        assert_eq!(assign_numbers(&entries).unwrap(), vec![3, 1, 2]);
    }

    #[test]
    fn test_duplicate_explicit_numbers_rejected() {
        let entries = vec![entry(Some(1), "甲"), entry(Some(1), "乙")];
        assert!(matches!(
            assign_numbers(&entries),
            Err(SourceError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_entry_accepts_url_alias() {
        let entry: ChapterEntry =
            serde_json::from_str(r#"{"title": "序章", "url": "/c/1"}"#).unwrap();
        assert_eq!(entry.src_url, "/c/1");
        assert_eq!(entry.number, None);
    }

    #[test]
    fn test_retryable() {
        assert!(SourceError::Timeout.is_retryable());
        assert!(SourceError::ServiceError {
            status: 503,
            message: String::new()
        }
        .is_retryable());
        assert!(!SourceError::ServiceError {
            status: 404,
            message: String::new()
        }
        .is_retryable());
        assert!(!SourceError::NoData("x".into()).is_retryable());
    }
}
