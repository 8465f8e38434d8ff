//! Catalog Command Handlers

use std::path::PathBuf;
use std::sync::Arc;

use crate::application::commands::{
    CreateBook, CreateChapter, ExportBook, RefreshBook, RefreshChapter, TagBook,
};
use crate::application::error::ApplicationError;
use crate::application::lazy_loading::LazyLoader;
use crate::application::ports::{
    BookExportPort, BookRepositoryPort, ChapterRepositoryPort, ExportedChapter, TagRepositoryPort,
};
use crate::application::resolver::{
    get_or_create_book, get_or_create_chapter, get_or_create_ship, get_or_create_tag,
};
use crate::domain::catalog::{
    Book, BookId, Chapter, NewBook, NewChapter, Tag, DEFAULT_CHAPTER_NUMBER,
};

async fn load_book(
    books: &dyn BookRepositoryPort,
    book_id: BookId,
) -> Result<Book, ApplicationError> {
    books
        .find_by_id(book_id)
        .await?
        .ok_or_else(|| ApplicationError::not_found("Book", book_id))
}

// ============================================================================
// CreateBook
// ============================================================================

#[derive(Debug, Clone)]
pub struct CreateBookResponse {
    pub book: Book,
    pub created: bool,
}

/// CreateBook Handler
pub struct CreateBookHandler {
    books: Arc<dyn BookRepositoryPort>,
}

impl CreateBookHandler {
    pub fn new(books: Arc<dyn BookRepositoryPort>) -> Self {
        Self { books }
    }

    pub async fn handle(&self, command: CreateBook) -> Result<CreateBookResponse, ApplicationError> {
        let new_book = NewBook {
            name: command.name.trim().to_string(),
            is_over: command.is_over,
            author: command.author,
            description: command.description,
            score: command.score,
            lock: command.lock,
            src_name: command.src_name,
            src_id: command.src_id,
            src_url: command.src_url,
            strategy_id: None,
        };
        new_book.validate()?;

        let (book, created) = get_or_create_book(self.books.as_ref(), new_book).await?;

        if created {
            tracing::info!(book_id = %book.id, name = %book.name, source = %book.src_name, "Book created");
        } else {
            tracing::debug!(book_id = %book.id, name = %book.name, "Book already exists");
        }

        Ok(CreateBookResponse { book, created })
    }
}

// ============================================================================
// CreateChapter
// ============================================================================

#[derive(Debug, Clone)]
pub struct CreateChapterResponse {
    pub chapter: Chapter,
    pub created: bool,
}

/// CreateChapter Handler
pub struct CreateChapterHandler {
    books: Arc<dyn BookRepositoryPort>,
    chapters: Arc<dyn ChapterRepositoryPort>,
}

impl CreateChapterHandler {
    pub fn new(
        books: Arc<dyn BookRepositoryPort>,
        chapters: Arc<dyn ChapterRepositoryPort>,
    ) -> Self {
        Self { books, chapters }
    }

    pub async fn handle(
        &self,
        command: CreateChapter,
    ) -> Result<CreateChapterResponse, ApplicationError> {
        let book = load_book(self.books.as_ref(), command.book_id).await?;

        let new_chapter = NewChapter::new(book.id, command.number.unwrap_or(DEFAULT_CHAPTER_NUMBER))
            .with_title(command.title)
            .with_content(command.content)
            .with_src_url(command.src_url);

        let (chapter, created) = get_or_create_chapter(self.chapters.as_ref(), new_chapter).await?;

        if created {
            tracing::info!(book_id = %book.id, number = chapter.number, "Chapter created");
        }

        Ok(CreateChapterResponse { chapter, created })
    }
}

// ============================================================================
// TagBook
// ============================================================================

#[derive(Debug, Clone)]
pub struct TagBookResponse {
    pub tag: Tag,
    /// 关联是否为新建
    pub created: bool,
}

/// TagBook Handler
pub struct TagBookHandler {
    books: Arc<dyn BookRepositoryPort>,
    tags: Arc<dyn TagRepositoryPort>,
}

impl TagBookHandler {
    pub fn new(books: Arc<dyn BookRepositoryPort>, tags: Arc<dyn TagRepositoryPort>) -> Self {
        Self { books, tags }
    }

    pub async fn handle(&self, command: TagBook) -> Result<TagBookResponse, ApplicationError> {
        let book = load_book(self.books.as_ref(), command.book_id).await?;
        let name = Tag::normalize_name(&command.tag)?;

        let (tag, _) = get_or_create_tag(self.tags.as_ref(), &name).await?;
        let (_, created) = get_or_create_ship(self.tags.as_ref(), book.id, tag.id).await?;

        tracing::info!(book_id = %book.id, tag = %tag.name, created, "Book tagged");

        Ok(TagBookResponse { tag, created })
    }
}

// ============================================================================
// ExportBook
// ============================================================================

#[derive(Debug, Clone)]
pub struct ExportBookResponse {
    pub path: PathBuf,
    pub chapter_count: usize,
}

/// ExportBook Handler - 章节和正文都走懒加载读取
pub struct ExportBookHandler {
    books: Arc<dyn BookRepositoryPort>,
    loader: Arc<LazyLoader>,
    exporter: Arc<dyn BookExportPort>,
}

impl ExportBookHandler {
    pub fn new(
        books: Arc<dyn BookRepositoryPort>,
        loader: Arc<LazyLoader>,
        exporter: Arc<dyn BookExportPort>,
    ) -> Self {
        Self {
            books,
            loader,
            exporter,
        }
    }

    pub async fn handle(&self, command: ExportBook) -> Result<ExportBookResponse, ApplicationError> {
        let mut book = load_book(self.books.as_ref(), command.book_id).await?;
        let chapters = self.loader.chapters(&mut book).await?;

        let mut exported = Vec::with_capacity(chapters.len());
        for mut chapter in chapters {
            let content = self.loader.full_content(&mut chapter).await?;
            exported.push(ExportedChapter {
                number: chapter.number,
                title: chapter.title,
                content,
            });
        }

        let path = self
            .exporter
            .export(&command.path, &book.name, &exported)
            .await?;

        Ok(ExportBookResponse {
            path,
            chapter_count: exported.len(),
        })
    }
}

// ============================================================================
// RefreshBook / RefreshChapter
// ============================================================================

/// RefreshBook Handler
pub struct RefreshBookHandler {
    books: Arc<dyn BookRepositoryPort>,
    loader: Arc<LazyLoader>,
}

impl RefreshBookHandler {
    pub fn new(books: Arc<dyn BookRepositoryPort>, loader: Arc<LazyLoader>) -> Self {
        Self { books, loader }
    }

    pub async fn handle(&self, command: RefreshBook) -> Result<Vec<Chapter>, ApplicationError> {
        let mut book = load_book(self.books.as_ref(), command.book_id).await?;
        Ok(self.loader.refresh_chapters(&mut book).await?)
    }
}

/// RefreshChapter Handler
pub struct RefreshChapterHandler {
    chapters: Arc<dyn ChapterRepositoryPort>,
    loader: Arc<LazyLoader>,
}

impl RefreshChapterHandler {
    pub fn new(chapters: Arc<dyn ChapterRepositoryPort>, loader: Arc<LazyLoader>) -> Self {
        Self { chapters, loader }
    }

    pub async fn handle(&self, command: RefreshChapter) -> Result<Chapter, ApplicationError> {
        let mut chapter = self
            .chapters
            .find_by_id(command.chapter_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Chapter", command.chapter_id))?;

        self.loader.refresh_content(&mut chapter).await?;
        Ok(chapter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::lazy_loading::LazyLoadingConfig;
    use crate::application::sources::SourceFactory;
    use crate::infrastructure::adapters::TxtExporter;
    use crate::infrastructure::persistence::sqlite::{
        create_pool, run_migrations, DatabaseConfig,
    };
    use crate::infrastructure::persistence::{
        SqliteBookRepository, SqliteChapterRepository, SqliteTagRepository,
    };

    struct Fixture {
        books: Arc<SqliteBookRepository>,
        chapters: Arc<SqliteChapterRepository>,
        tags: Arc<SqliteTagRepository>,
        loader: Arc<LazyLoader>,
    }

    async fn fixture() -> Fixture {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        let books = Arc::new(SqliteBookRepository::new(pool.clone()));
        let chapters = Arc::new(SqliteChapterRepository::new(pool.clone()));
        let tags = Arc::new(SqliteTagRepository::new(pool));
        let loader = Arc::new(LazyLoader::new(
            books.clone(),
            chapters.clone(),
            SourceFactory::default(),
            LazyLoadingConfig::default(),
        ));
        Fixture {
            books,
            chapters,
            tags,
            loader,
        }
    }

    fn create_book(name: &str) -> CreateBook {
        CreateBook {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_book_is_idempotent() {
        let fx = fixture().await;
        let handler = CreateBookHandler::new(fx.books.clone());

        let first = handler.handle(create_book("雪中悍刀行")).await.unwrap();
        let second = handler
            .handle(CreateBook {
                author: "烽火戏诸侯".to_string(),
                ..create_book("雪中悍刀行")
            })
            .await
            .unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.book.id, second.book.id);
        assert_eq!(second.book.author, "");
        assert_eq!(fx.books.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_book_rejects_blank_name() {
        let fx = fixture().await;
        let handler = CreateBookHandler::new(fx.books.clone());
        let err = handler.handle(create_book("   ")).await.unwrap_err();
        assert!(matches!(err, ApplicationError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_create_chapter_requires_book() {
        let fx = fixture().await;
        let handler = CreateChapterHandler::new(fx.books.clone(), fx.chapters.clone());
        let err = handler
            .handle(CreateChapter {
                book_id: BookId::new(99),
                number: Some(1),
                title: String::new(),
                content: String::new(),
                src_url: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_tag_book_twice_keeps_one_ship() {
        let fx = fixture().await;
        let book = CreateBookHandler::new(fx.books.clone())
            .handle(create_book("诡秘之主"))
            .await
            .unwrap()
            .book;
        let handler = TagBookHandler::new(fx.books.clone(), fx.tags.clone());

        let first = handler
            .handle(TagBook {
                book_id: book.id,
                tag: " 克苏鲁 ".to_string(),
            })
            .await
            .unwrap();
        let second = handler
            .handle(TagBook {
                book_id: book.id,
                tag: "克苏鲁".to_string(),
            })
            .await
            .unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.tag.id, second.tag.id);
        assert_eq!(fx.tags.find_by_book(book.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_export_round_trip_in_number_order() {
        let fx = fixture().await;
        let book = CreateBookHandler::new(fx.books.clone())
            .handle(create_book("两章书"))
            .await
            .unwrap()
            .book;
        let chapter_handler = CreateChapterHandler::new(fx.books.clone(), fx.chapters.clone());
        for (number, title, content) in [(2, "第二章", "乙"), (1, "第一章", "甲")] {
            chapter_handler
                .handle(CreateChapter {
                    book_id: book.id,
                    number: Some(number),
                    title: title.to_string(),
                    content: content.to_string(),
                    src_url: String::new(),
                })
                .await
                .unwrap();
        }

        let temp_dir = tempfile::tempdir().unwrap();
        let handler =
            ExportBookHandler::new(fx.books.clone(), fx.loader.clone(), Arc::new(TxtExporter::new()));
        let response = handler
            .handle(ExportBook {
                book_id: book.id,
                path: temp_dir.path().join("book"),
            })
            .await
            .unwrap();

        assert_eq!(response.chapter_count, 2);
        assert_eq!(response.path, temp_dir.path().join("book.txt"));
        let text = std::fs::read_to_string(&response.path).unwrap();
        assert_eq!(text, "第一章\n甲\n\n第二章\n乙\n\n");
    }
}
