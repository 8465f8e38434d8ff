//! Lazy-Loading Orchestrator - 按需拉取并回填缺失数据
//!
//! 判定字段是否缺失，选择对应书源的适配器调用，写回存储：
//! - 章节列表：书没有任何章节且 `chapters_state` 为 Unresolved
//! - 章节正文：`content` 为空且 `content_state` 为 Unresolved
//!
//! 同一本书 / 同一章节的并发加载会串行化，后到者拿到锁后重新读取持久化状态，
//! 如果前一个调用者已经解析完成则直接复用，不再重复拉取。

use std::sync::Arc;

use dashmap::DashMap;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::application::error::LazyLoadError;
use crate::application::ports::{
    assign_numbers, BookRepositoryPort, ChapterRepositoryPort, RepositoryError, SourcePort,
};
use crate::application::sources::SourceFactory;
use crate::domain::catalog::{Book, BookId, Chapter, ChapterId, NewChapter, ResolutionState};

/// 懒加载开关
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LazyLoadingConfig {
    /// 章节列表懒加载
    #[serde(default = "default_enabled")]
    pub chapters: bool,

    /// 章节正文懒加载
    #[serde(default = "default_enabled")]
    pub content: bool,
}

fn default_enabled() -> bool {
    true
}

impl Default for LazyLoadingConfig {
    fn default() -> Self {
        Self {
            chapters: default_enabled(),
            content: default_enabled(),
        }
    }
}

impl LazyLoadingConfig {
    pub fn disabled() -> Self {
        Self {
            chapters: false,
            content: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum LoadKey {
    Book(BookId),
    Chapter(ChapterId),
}

/// 懒加载编排器
pub struct LazyLoader {
    books: Arc<dyn BookRepositoryPort>,
    chapters: Arc<dyn ChapterRepositoryPort>,
    sources: SourceFactory,
    config: LazyLoadingConfig,
    in_flight: DashMap<LoadKey, Arc<Mutex<()>>>,
}

impl LazyLoader {
    pub fn new(
        books: Arc<dyn BookRepositoryPort>,
        chapters: Arc<dyn ChapterRepositoryPort>,
        sources: SourceFactory,
        config: LazyLoadingConfig,
    ) -> Self {
        Self {
            books,
            chapters,
            sources,
            config,
            in_flight: DashMap::new(),
        }
    }

    pub fn config(&self) -> LazyLoadingConfig {
        self.config
    }

    pub fn sources(&self) -> &SourceFactory {
        &self.sources
    }

    // ========================================================================
    // Book
    // ========================================================================

    /// 书的章节列表（按 number 升序）
    ///
    /// 本地没有章节时按配置触发懒加载，之后重新读取（可能仍为空）。
    pub async fn chapters(&self, book: &mut Book) -> Result<Vec<Chapter>, LazyLoadError> {
        let chapters = self.chapters.find_by_book(book.id).await?;
        if !chapters.is_empty() {
            return Ok(chapters);
        }

        if !self.config.chapters || !book.chapters_state.is_unresolved() {
            return Ok(chapters);
        }

        self.lazy_loading(book).await?;
        Ok(self.chapters.find_by_book(book.id).await?)
    }

    /// 从书源补全元数据并拉取章节列表
    ///
    /// author、description、score 全为空时才拉取元数据；章节列表总是拉取。
    /// `src_name` 为空时什么也不做。
    pub async fn lazy_loading(&self, book: &mut Book) -> Result<(), LazyLoadError> {
        self.load_book(book, false).await
    }

    /// 强制重新拉取章节列表，忽略 Empty 标记；锁定的书拒绝刷新
    pub async fn refresh_chapters(&self, book: &mut Book) -> Result<Vec<Chapter>, LazyLoadError> {
        if book.lock {
            return Err(LazyLoadError::Locked {
                entity: "Book",
                id: book.id.value(),
            });
        }
        self.load_book(book, true).await?;
        Ok(self.chapters.find_by_book(book.id).await?)
    }

    async fn load_book(&self, book: &mut Book, force: bool) -> Result<(), LazyLoadError> {
        if !book.has_source() {
            tracing::debug!(book_id = %book.id, "Book has no source, skipping lazy loading");
            return Ok(());
        }
        let source = self.sources.get_source(&book.src_name)?;

        let key = LoadKey::Book(book.id);
        let slot = self.acquire_slot(key);
        let result = {
            let _guard = slot.lock().await;
            self.load_book_locked(book, source.as_ref(), force).await
        };
        drop(slot);
        self.release_slot(key);
        result
    }

    async fn load_book_locked(
        &self,
        book: &mut Book,
        source: &dyn SourcePort,
        force: bool,
    ) -> Result<(), LazyLoadError> {
        if !force && book.chapters_state.is_unresolved() {
            if let Some(current) = self.books.find_by_id(book.id).await? {
                if !current.chapters_state.is_unresolved() {
                    tracing::debug!(book_id = %book.id, "Chapters resolved by a concurrent load");
                    *book = current;
                    return Ok(());
                }
            }
        }

        let source_name = book.src_name.clone();
        tracing::info!(
            book_id = %book.id,
            book = %book.name,
            source = %source_name,
            "Lazy loading book"
        );

        let mut updated = book.clone();
        if updated.needs_detail() {
            let detail = source
                .get_book_detail(&updated)
                .await
                .map_err(|e| LazyLoadError::fetch(&source_name, e))?;
            updated.apply_detail(&detail);
            self.books.update(&updated).await?;
            *book = updated.clone();
            tracing::debug!(book_id = %book.id, author = %book.author, "Book detail filled");
        }

        let entries = source
            .get_chapters(&updated)
            .await
            .map_err(|e| LazyLoadError::fetch(&source_name, e))?;
        let numbers =
            assign_numbers(&entries).map_err(|e| LazyLoadError::fetch(&source_name, e))?;
        let listing: Vec<NewChapter> = entries
            .into_iter()
            .zip(numbers)
            .map(|(entry, number)| entry.into_new_chapter(updated.id, number))
            .collect();

        let saved = self.chapters.upsert_listing(updated.id, &listing).await?;
        updated.set_chapters_state(ResolutionState::settled(saved.is_empty()));
        self.books.update(&updated).await?;
        *book = updated;

        tracing::info!(
            book_id = %book.id,
            fetched = listing.len(),
            total = saved.len(),
            state = %book.chapters_state,
            "Chapter list resolved"
        );
        Ok(())
    }

    // ========================================================================
    // Chapter
    // ========================================================================

    /// 章节正文
    ///
    /// 正文为空时按配置触发懒加载；书源失败时返回错误，正文保持未解析。
    pub async fn full_content(&self, chapter: &mut Chapter) -> Result<String, LazyLoadError> {
        if chapter.has_content() {
            return Ok(chapter.content.clone());
        }

        if self.config.content && chapter.content_state.is_unresolved() {
            self.load_chapter(chapter, false).await?;
        }
        Ok(chapter.content.clone())
    }

    /// 通过父书的书源拉取正文
    pub async fn lazy_load_chapter(&self, chapter: &mut Chapter) -> Result<(), LazyLoadError> {
        self.load_chapter(chapter, false).await
    }

    /// 强制重新拉取正文；锁定的章节拒绝刷新
    pub async fn refresh_content(&self, chapter: &mut Chapter) -> Result<String, LazyLoadError> {
        if chapter.lock {
            return Err(LazyLoadError::Locked {
                entity: "Chapter",
                id: chapter.id.value(),
            });
        }
        self.load_chapter(chapter, true).await?;
        Ok(chapter.content.clone())
    }

    async fn load_chapter(&self, chapter: &mut Chapter, force: bool) -> Result<(), LazyLoadError> {
        let book = self
            .books
            .find_by_id(chapter.book_id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("book {}", chapter.book_id)))?;
        if !book.has_source() {
            tracing::debug!(chapter_id = %chapter.id, "Book has no source, skipping lazy loading");
            return Ok(());
        }
        let source = self.sources.get_source(&book.src_name)?;

        let key = LoadKey::Chapter(chapter.id);
        let slot = self.acquire_slot(key);
        let result = {
            let _guard = slot.lock().await;
            self.load_chapter_locked(&book, chapter, source.as_ref(), force)
                .await
        };
        drop(slot);
        self.release_slot(key);
        result
    }

    async fn load_chapter_locked(
        &self,
        book: &Book,
        chapter: &mut Chapter,
        source: &dyn SourcePort,
        force: bool,
    ) -> Result<(), LazyLoadError> {
        if !force && chapter.content_state.is_unresolved() {
            if let Some(current) = self.chapters.find_by_id(chapter.id).await? {
                if !current.content_state.is_unresolved() {
                    tracing::debug!(chapter_id = %chapter.id, "Content resolved by a concurrent load");
                    *chapter = current;
                    return Ok(());
                }
            }
        }

        tracing::info!(
            book_id = %book.id,
            chapter_id = %chapter.id,
            number = chapter.number,
            source = %book.src_name,
            "Lazy loading chapter content"
        );

        let content = source
            .get_chapter_content(book, chapter)
            .await
            .map_err(|e| LazyLoadError::fetch(&book.src_name, e))?;

        let mut updated = chapter.clone();
        updated.set_content(content);
        self.chapters.update(&updated).await?;
        *chapter = updated;

        tracing::info!(
            chapter_id = %chapter.id,
            chars = chapter.content.chars().count(),
            state = %chapter.content_state,
            "Chapter content resolved"
        );
        Ok(())
    }

    // ========================================================================
    // In-flight guards
    // ========================================================================

    fn acquire_slot(&self, key: LoadKey) -> Arc<Mutex<()>> {
        self.in_flight
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn release_slot(&self, key: LoadKey) {
        self.in_flight
            .remove_if(&key, |_, slot| Arc::strong_count(slot) == 1);
    }
}
