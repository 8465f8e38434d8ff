//! Catalog Queries

use crate::domain::catalog::{BookId, ChapterId, Direction};

/// 按 id 获取书籍
#[derive(Debug, Clone)]
pub struct GetBook {
    pub book_id: BookId,
}

/// 按书名获取书籍
#[derive(Debug, Clone)]
pub struct GetBookByName {
    pub name: String,
}

/// 列出书籍，可按标签过滤
#[derive(Debug, Clone, Default)]
pub struct ListBooks {
    pub tag: Option<String>,
}

/// 获取章节列表（必要时懒加载）
#[derive(Debug, Clone)]
pub struct GetBookChapters {
    pub book_id: BookId,
}

/// 获取章节正文（必要时懒加载）
#[derive(Debug, Clone)]
pub struct GetChapterContent {
    pub book_id: BookId,
    pub number: i32,
}

/// 获取相邻章节，不触发懒加载
#[derive(Debug, Clone)]
pub struct GetAdjacentChapter {
    pub chapter_id: ChapterId,
    pub direction: Direction,
}

/// 列出书的标签
#[derive(Debug, Clone)]
pub struct ListBookTags {
    pub book_id: BookId,
}
