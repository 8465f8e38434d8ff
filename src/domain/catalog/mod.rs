//! Catalog Context - 书目限界上下文
//!
//! 职责:
//! - 书籍聚合管理
//! - 章节实体与相邻章节定位
//! - 标签与书籍的关联
//! - 懒加载字段的解析状态

mod book;
mod chapter;
mod errors;
mod tag;
mod value_objects;

pub use book::{validate_book_name, Book, BookDetail, NewBook, BOOK_NAME_MAX_CHARS};
pub use chapter::{Chapter, Direction, NewChapter, DEFAULT_CHAPTER_NUMBER};
pub use errors::CatalogError;
pub use tag::{BookTagShip, Tag};
pub use value_objects::{BookId, ChapterId, ResolutionState, TagId};
