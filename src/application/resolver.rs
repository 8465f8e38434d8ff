//! Unique-Key Resolver - 基于自然键的 get-or-create
//!
//! 先用自然键查找，找不到才插入。并发调用者可能同时错过查找，
//! 存储层的唯一约束会让后到的插入失败（`RepositoryError::Duplicate`），
//! 此时重新查找并返回已存在的那一行。

use std::future::Future;

use crate::application::ports::{
    BookRepositoryPort, ChapterRepositoryPort, RepositoryError, TagRepositoryPort,
};
use crate::domain::catalog::{Book, BookId, BookTagShip, Chapter, NewBook, NewChapter, Tag, TagId};

/// 通用 get-or-create
///
/// 返回 `(实体, 是否新建)`
pub async fn get_or_create<T, Lookup, LookupFut, Create, CreateFut>(
    lookup: Lookup,
    create: Create,
) -> Result<(T, bool), RepositoryError>
where
    Lookup: Fn() -> LookupFut,
    LookupFut: Future<Output = Result<Option<T>, RepositoryError>>,
    Create: FnOnce() -> CreateFut,
    CreateFut: Future<Output = Result<T, RepositoryError>>,
{
    if let Some(existing) = lookup().await? {
        return Ok((existing, false));
    }

    match create().await {
        Ok(created) => Ok((created, true)),
        Err(RepositoryError::Duplicate(key)) => {
            tracing::debug!(key = %key, "Insert lost a uniqueness race, re-reading");
            match lookup().await? {
                Some(existing) => Ok((existing, false)),
                None => Err(RepositoryError::Duplicate(key)),
            }
        }
        Err(e) => Err(e),
    }
}

/// 按书名 get-or-create
pub async fn get_or_create_book(
    books: &dyn BookRepositoryPort,
    new_book: NewBook,
) -> Result<(Book, bool), RepositoryError> {
    let name = new_book.name.as_str();
    let new_book = &new_book;
    get_or_create(
        move || books.find_by_name(name),
        move || books.insert(new_book),
    )
    .await
}

/// 按 (book, number) get-or-create
pub async fn get_or_create_chapter(
    chapters: &dyn ChapterRepositoryPort,
    new_chapter: NewChapter,
) -> Result<(Chapter, bool), RepositoryError> {
    let (book_id, number) = (new_chapter.book_id, new_chapter.number);
    let new_chapter = &new_chapter;
    get_or_create(
        move || chapters.find_by_number(book_id, number),
        move || chapters.insert(new_chapter),
    )
    .await
}

/// 按名称 get-or-create 标签
pub async fn get_or_create_tag(
    tags: &dyn TagRepositoryPort,
    name: &str,
) -> Result<(Tag, bool), RepositoryError> {
    get_or_create(move || tags.find_by_name(name), move || tags.insert(name)).await
}

/// 按 (book, tag) get-or-create 关联行
pub async fn get_or_create_ship(
    tags: &dyn TagRepositoryPort,
    book_id: BookId,
    tag_id: TagId,
) -> Result<(BookTagShip, bool), RepositoryError> {
    get_or_create(
        move || tags.find_ship(book_id, tag_id),
        move || tags.insert_ship(book_id, tag_id),
    )
    .await
}
