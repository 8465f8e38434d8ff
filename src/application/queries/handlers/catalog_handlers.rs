//! Catalog Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::lazy_loading::LazyLoader;
use crate::application::ports::{BookRepositoryPort, ChapterRepositoryPort, TagRepositoryPort};
use crate::application::queries::{
    GetAdjacentChapter, GetBook, GetBookByName, GetBookChapters, GetChapterContent, ListBookTags,
    ListBooks,
};
use crate::domain::catalog::{Book, BookId, Chapter, ChapterId};

// ============================================================================
// Response DTOs
// ============================================================================

/// 书籍详情响应
#[derive(Debug, Clone)]
pub struct BookResponse {
    pub id: BookId,
    pub name: String,
    pub author: String,
    pub description: String,
    pub score: i64,
    pub is_over: bool,
    pub lock: bool,
    pub src_name: String,
    pub src_id: String,
    pub chapters_state: String,
    pub created_at: String,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            name: book.name,
            author: book.author,
            description: book.description,
            score: book.score,
            is_over: book.is_over,
            lock: book.lock,
            src_name: book.src_name,
            src_id: book.src_id,
            chapters_state: book.chapters_state.as_str().to_string(),
            created_at: book.created_at.to_rfc3339(),
        }
    }
}

/// 章节目录项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterSummary {
    pub id: ChapterId,
    pub number: i32,
    pub title: String,
    pub has_content: bool,
}

impl From<&Chapter> for ChapterSummary {
    fn from(chapter: &Chapter) -> Self {
        Self {
            id: chapter.id,
            number: chapter.number,
            title: chapter.title.clone(),
            has_content: chapter.has_content(),
        }
    }
}

/// 章节正文响应
#[derive(Debug, Clone)]
pub struct ChapterContentResponse {
    pub chapter: ChapterSummary,
    pub content: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GetBook Handler
pub struct GetBookHandler {
    books: Arc<dyn BookRepositoryPort>,
}

impl GetBookHandler {
    pub fn new(books: Arc<dyn BookRepositoryPort>) -> Self {
        Self { books }
    }

    pub async fn handle(&self, query: GetBook) -> Result<BookResponse, ApplicationError> {
        let book = self
            .books
            .find_by_id(query.book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Book", query.book_id))?;

        Ok(BookResponse::from(book))
    }
}

/// GetBookByName Handler
pub struct GetBookByNameHandler {
    books: Arc<dyn BookRepositoryPort>,
}

impl GetBookByNameHandler {
    pub fn new(books: Arc<dyn BookRepositoryPort>) -> Self {
        Self { books }
    }

    pub async fn handle(&self, query: GetBookByName) -> Result<BookResponse, ApplicationError> {
        let book = self
            .books
            .find_by_name(&query.name)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Book", &query.name))?;

        Ok(BookResponse::from(book))
    }
}

/// ListBooks Handler
pub struct ListBooksHandler {
    books: Arc<dyn BookRepositoryPort>,
    tags: Arc<dyn TagRepositoryPort>,
}

impl ListBooksHandler {
    pub fn new(books: Arc<dyn BookRepositoryPort>, tags: Arc<dyn TagRepositoryPort>) -> Self {
        Self { books, tags }
    }

    pub async fn handle(&self, query: ListBooks) -> Result<Vec<BookResponse>, ApplicationError> {
        let books = match query.tag {
            Some(name) => match self.tags.find_by_name(name.trim()).await? {
                Some(tag) => self.books.find_by_tag(tag.id).await?,
                None => Vec::new(),
            },
            None => self.books.find_all().await?,
        };

        Ok(books.into_iter().map(BookResponse::from).collect())
    }
}

/// GetBookChapters Handler
pub struct GetBookChaptersHandler {
    books: Arc<dyn BookRepositoryPort>,
    loader: Arc<LazyLoader>,
}

impl GetBookChaptersHandler {
    pub fn new(books: Arc<dyn BookRepositoryPort>, loader: Arc<LazyLoader>) -> Self {
        Self { books, loader }
    }

    pub async fn handle(
        &self,
        query: GetBookChapters,
    ) -> Result<Vec<ChapterSummary>, ApplicationError> {
        let mut book = self
            .books
            .find_by_id(query.book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Book", query.book_id))?;

        let chapters = self.loader.chapters(&mut book).await?;
        Ok(chapters.iter().map(ChapterSummary::from).collect())
    }
}

/// GetChapterContent Handler
pub struct GetChapterContentHandler {
    chapters: Arc<dyn ChapterRepositoryPort>,
    loader: Arc<LazyLoader>,
}

impl GetChapterContentHandler {
    pub fn new(chapters: Arc<dyn ChapterRepositoryPort>, loader: Arc<LazyLoader>) -> Self {
        Self { chapters, loader }
    }

    pub async fn handle(
        &self,
        query: GetChapterContent,
    ) -> Result<ChapterContentResponse, ApplicationError> {
        let mut chapter = self
            .chapters
            .find_by_number(query.book_id, query.number)
            .await?
            .ok_or_else(|| {
                ApplicationError::not_found(
                    "Chapter",
                    format!("book {} #{}", query.book_id, query.number),
                )
            })?;

        let content = self.loader.full_content(&mut chapter).await?;
        Ok(ChapterContentResponse {
            chapter: ChapterSummary::from(&chapter),
            content,
        })
    }
}

/// GetAdjacentChapter Handler
///
/// 相邻章节只读存储，未持久化时返回 None
pub struct GetAdjacentChapterHandler {
    chapters: Arc<dyn ChapterRepositoryPort>,
}

impl GetAdjacentChapterHandler {
    pub fn new(chapters: Arc<dyn ChapterRepositoryPort>) -> Self {
        Self { chapters }
    }

    pub async fn handle(
        &self,
        query: GetAdjacentChapter,
    ) -> Result<Option<ChapterSummary>, ApplicationError> {
        let chapter = self
            .chapters
            .find_by_id(query.chapter_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Chapter", query.chapter_id))?;

        let Some(number) = chapter.sibling_number(query.direction) else {
            return Ok(None);
        };

        let sibling = self.chapters.find_by_number(chapter.book_id, number).await?;
        Ok(sibling.as_ref().map(ChapterSummary::from))
    }
}

/// ListBookTags Handler
pub struct ListBookTagsHandler {
    tags: Arc<dyn TagRepositoryPort>,
}

impl ListBookTagsHandler {
    pub fn new(tags: Arc<dyn TagRepositoryPort>) -> Self {
        Self { tags }
    }

    pub async fn handle(&self, query: ListBookTags) -> Result<Vec<String>, ApplicationError> {
        let tags = self.tags.find_by_book(query.book_id).await?;
        Ok(tags.into_iter().map(|tag| tag.name).collect())
    }
}
