//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod book_export;
mod repositories;
mod source;

pub use book_export::{BookExportPort, ExportError, ExportedChapter};
pub use repositories::{
    BookFilter, BookRepositoryPort, ChapterFilter, ChapterRepositoryPort, RepositoryError,
    TagRepositoryPort,
};
pub use source::{assign_numbers, position_number, ChapterEntry, SourceError, SourcePort};
