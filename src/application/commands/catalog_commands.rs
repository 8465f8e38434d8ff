//! Catalog Commands

use std::path::PathBuf;

use crate::domain::catalog::{BookId, ChapterId};

/// 按书名 get-or-create 一本书
///
/// 书名已存在时返回已有记录，其余字段不会覆盖已有值
#[derive(Debug, Clone, Default)]
pub struct CreateBook {
    pub name: String,
    pub author: String,
    pub description: String,
    pub score: i64,
    pub is_over: bool,
    pub lock: bool,
    pub src_name: String,
    pub src_id: String,
    pub src_url: String,
}

/// 按 (book, number) get-or-create 一章
#[derive(Debug, Clone)]
pub struct CreateChapter {
    pub book_id: BookId,
    /// 缺省为 -1
    pub number: Option<i32>,
    pub title: String,
    pub content: String,
    pub src_url: String,
}

/// 给书打标签
#[derive(Debug, Clone)]
pub struct TagBook {
    pub book_id: BookId,
    pub tag: String,
}

/// 导出整本书为纯文本
#[derive(Debug, Clone)]
pub struct ExportBook {
    pub book_id: BookId,
    pub path: PathBuf,
}

/// 强制重新拉取章节列表
#[derive(Debug, Clone)]
pub struct RefreshBook {
    pub book_id: BookId,
}

/// 强制重新拉取章节正文
#[derive(Debug, Clone)]
pub struct RefreshChapter {
    pub chapter_id: ChapterId,
}
