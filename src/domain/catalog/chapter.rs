//! Catalog Context - Entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, ChapterId, ResolutionState};

/// 未指定章节号时的默认值
pub const DEFAULT_CHAPTER_NUMBER: i32 = -1;

/// 章节 - Book 的有序子实体
///
/// 不变量:
/// - (book_id, number) 在书内唯一，`number` 为排序键
/// - `content` 为空串表示尚未解析
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: ChapterId,
    pub book_id: BookId,
    pub title: String,
    pub number: i32,
    pub lock: bool,
    pub content: String,
    pub src_url: String,
    /// 正文的懒加载状态
    pub content_state: ResolutionState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chapter {
    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }

    /// 写入拉取到的正文，并据此确定解析状态
    pub fn set_content(&mut self, content: String) {
        self.content_state = ResolutionState::settled(content.is_empty());
        self.content = content;
        self.updated_at = Utc::now();
    }

    /// 相邻章节的章节号，溢出时返回 None
    pub fn sibling_number(&self, direction: Direction) -> Option<i32> {
        match direction {
            Direction::Before => self.number.checked_sub(1),
            Direction::After => self.number.checked_add(1),
        }
    }
}

impl std::fmt::Display for Chapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}

/// 相邻章节方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Before,
    After,
}

/// 待创建的章节
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChapter {
    pub book_id: BookId,
    pub number: i32,
    pub title: String,
    pub lock: bool,
    pub content: String,
    pub src_url: String,
}

impl NewChapter {
    pub fn new(book_id: BookId, number: i32) -> Self {
        Self {
            book_id,
            number,
            title: String::new(),
            lock: false,
            content: String::new(),
            src_url: String::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_src_url(mut self, src_url: impl Into<String>) -> Self {
        self.src_url = src_url.into();
        self
    }

    /// 创建时已带正文的章节直接视为已解析
    pub fn initial_content_state(&self) -> ResolutionState {
        if self.content.is_empty() {
            ResolutionState::Unresolved
        } else {
            ResolutionState::Resolved
        }
    }

    pub fn into_chapter(self, id: ChapterId, now: DateTime<Utc>) -> Chapter {
        let content_state = self.initial_content_state();
        Chapter {
            id,
            book_id: self.book_id,
            title: self.title,
            number: self.number,
            lock: self.lock,
            content: self.content,
            src_url: self.src_url,
            content_state,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter(number: i32) -> Chapter {
        NewChapter::new(BookId::new(1), number)
            .with_title(format!("第{}章", number))
            .into_chapter(ChapterId::new(number as i64), Utc::now())
    }

    #[test]
    fn test_sibling_number() {
        let ch = chapter(2);
        assert_eq!(ch.sibling_number(Direction::Before), Some(1));
        assert_eq!(ch.sibling_number(Direction::After), Some(3));

        let last = chapter(i32::MAX);
        assert_eq!(last.sibling_number(Direction::After), None);
    }

    #[test]
    fn test_set_content_settles_state() {
        let mut ch = chapter(1);
        assert_eq!(ch.content_state, ResolutionState::Unresolved);

        ch.set_content(String::new());
        assert_eq!(ch.content_state, ResolutionState::Empty);

        ch.set_content("正文".to_string());
        assert_eq!(ch.content_state, ResolutionState::Resolved);
        assert!(ch.has_content());
    }

    #[test]
    fn test_prepopulated_content_is_resolved() {
        let ch = NewChapter::new(BookId::new(1), 1)
            .with_content("已导入")
            .into_chapter(ChapterId::new(1), Utc::now());
        assert_eq!(ch.content_state, ResolutionState::Resolved);
    }
}
