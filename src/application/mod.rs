//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（Repository、Source、BookExport）
//! - resolver: 基于自然键的 get-or-create
//! - sources: 书源注册表
//! - lazy_loading: 懒加载编排器
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod lazy_loading;
pub mod ports;
pub mod queries;
pub mod resolver;
pub mod sources;

// Re-exports
pub use commands::{
    CreateBook,
    CreateChapter,
    ExportBook,
    RefreshBook,
    RefreshChapter,
    TagBook,
    // Handlers
    handlers::{
        CreateBookHandler, CreateChapterHandler, ExportBookHandler, RefreshBookHandler,
        RefreshChapterHandler, TagBookHandler,
    },
};

pub use error::{ApplicationError, LazyLoadError};

pub use lazy_loading::{LazyLoader, LazyLoadingConfig};

pub use ports::{
    // Export
    BookExportPort,
    ExportError,
    ExportedChapter,
    // Repositories
    BookFilter,
    BookRepositoryPort,
    ChapterFilter,
    ChapterRepositoryPort,
    RepositoryError,
    TagRepositoryPort,
    // Source
    ChapterEntry,
    SourceError,
    SourcePort,
};

pub use queries::{
    GetAdjacentChapter,
    GetBook,
    GetBookByName,
    GetBookChapters,
    GetChapterContent,
    ListBookTags,
    ListBooks,
    // Handlers
    handlers::{
        BookResponse, ChapterContentResponse, ChapterSummary, GetAdjacentChapterHandler,
        GetBookByNameHandler, GetBookChaptersHandler, GetBookHandler, GetChapterContentHandler,
        ListBookTagsHandler, ListBooksHandler,
    },
};

pub use sources::{SourceFactory, SourceFactoryBuilder, UnsupportedSourceError};
