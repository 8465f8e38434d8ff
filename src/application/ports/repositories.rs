//! Repository Ports - 出站端口
//!
//! 定义数据持久化的抽象接口
//! 具体实现在 infrastructure 层（如 SQLite）
//!
//! 每个仓储都提供两类查找原语：
//! - 自然键精确匹配（`find_by_name` / `find_by_number`）
//! - 任意字段组合精确匹配（`find_one`），多行命中时取 id 最小的一行

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::catalog::{
    Book, BookId, BookTagShip, Chapter, ChapterId, NewBook, NewChapter, Tag, TagId,
};

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

// ============================================================================
// Book Repository
// ============================================================================

/// 书籍字段过滤条件，None 表示不参与匹配
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub name: Option<String>,
    pub author: Option<String>,
    pub is_over: Option<bool>,
    pub src_name: Option<String>,
    pub src_id: Option<String>,
    pub src_url: Option<String>,
}

impl BookFilter {
    pub fn by_source(src_name: impl Into<String>, src_id: impl Into<String>) -> Self {
        Self {
            src_name: Some(src_name.into()),
            src_id: Some(src_id.into()),
            ..Default::default()
        }
    }
}

/// Book Repository Port
#[async_trait]
pub trait BookRepositoryPort: Send + Sync {
    /// 插入新书，名称冲突时返回 `Duplicate`
    async fn insert(&self, book: &NewBook) -> Result<Book, RepositoryError>;

    /// 更新已有书籍的全部可变字段
    async fn update(&self, book: &Book) -> Result<(), RepositoryError>;

    /// 根据 ID 查找
    async fn find_by_id(&self, id: BookId) -> Result<Option<Book>, RepositoryError>;

    /// 根据书名（自然键）查找
    async fn find_by_name(&self, name: &str) -> Result<Option<Book>, RepositoryError>;

    /// 根据任意字段组合查找，多行命中时返回 id 最小的一行
    async fn find_one(&self, filter: &BookFilter) -> Result<Option<Book>, RepositoryError>;

    /// 获取所有书籍（按 id 排序）
    async fn find_all(&self) -> Result<Vec<Book>, RepositoryError>;

    /// 获取带有指定标签的书籍
    async fn find_by_tag(&self, tag_id: TagId) -> Result<Vec<Book>, RepositoryError>;
}

// ============================================================================
// Chapter Repository
// ============================================================================

/// 章节字段过滤条件，None 表示不参与匹配
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterFilter {
    pub book_id: Option<BookId>,
    pub number: Option<i32>,
    pub title: Option<String>,
    pub src_url: Option<String>,
}

impl ChapterFilter {
    pub fn by_number(book_id: BookId, number: i32) -> Self {
        Self {
            book_id: Some(book_id),
            number: Some(number),
            ..Default::default()
        }
    }
}

/// Chapter Repository Port
#[async_trait]
pub trait ChapterRepositoryPort: Send + Sync {
    /// 插入新章节，(book_id, number) 冲突时返回 `Duplicate`
    async fn insert(&self, chapter: &NewChapter) -> Result<Chapter, RepositoryError>;

    /// 更新已有章节
    async fn update(&self, chapter: &Chapter) -> Result<(), RepositoryError>;

    /// 根据 ID 查找
    async fn find_by_id(&self, id: ChapterId) -> Result<Option<Chapter>, RepositoryError>;

    /// 根据 (book_id, number) 查找
    async fn find_by_number(
        &self,
        book_id: BookId,
        number: i32,
    ) -> Result<Option<Chapter>, RepositoryError> {
        self.find_one(&ChapterFilter::by_number(book_id, number)).await
    }

    /// 根据任意字段组合查找，多行命中时返回 id 最小的一行
    async fn find_one(&self, filter: &ChapterFilter) -> Result<Option<Chapter>, RepositoryError>;

    /// 获取书的所有章节，按 number 升序
    async fn find_by_book(&self, book_id: BookId) -> Result<Vec<Chapter>, RepositoryError>;

    /// 在一个事务内写入来源返回的章节列表
    ///
    /// 按 (book_id, number) upsert：已存在的章节更新标题和来源 URL，
    /// 只有非空正文才会覆盖已有正文。返回写入后的全部章节（按 number 升序）。
    async fn upsert_listing(
        &self,
        book_id: BookId,
        chapters: &[NewChapter],
    ) -> Result<Vec<Chapter>, RepositoryError>;
}

// ============================================================================
// Tag Repository
// ============================================================================

/// Tag Repository Port
#[async_trait]
pub trait TagRepositoryPort: Send + Sync {
    async fn insert(&self, name: &str) -> Result<Tag, RepositoryError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Tag>, RepositoryError>;

    async fn insert_ship(
        &self,
        book_id: BookId,
        tag_id: TagId,
    ) -> Result<BookTagShip, RepositoryError>;

    async fn find_ship(
        &self,
        book_id: BookId,
        tag_id: TagId,
    ) -> Result<Option<BookTagShip>, RepositoryError>;

    /// 书籍的全部标签（按名称排序）
    async fn find_by_book(&self, book_id: BookId) -> Result<Vec<Tag>, RepositoryError>;
}
