//! Fixture Source - 从 JSON 文件读取的静态书源
//!
//! 离线导入和演示用，不访问网络。文件格式:
//!
//! ```json
//! {
//!   "books": {
//!     "1001": {
//!       "detail": {"author": "...", "description": "...", "score": 9},
//!       "chapters": [{"title": "第一章", "url": "/c/1", "content": "..."}]
//!     }
//!   }
//! }
//! ```
//!
//! 目录只返回标题和 URL，正文在 `get_chapter_content` 时按 URL（或章节号）返回。

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::application::ports::{assign_numbers, ChapterEntry, SourceError, SourcePort};
use crate::domain::catalog::{Book, BookDetail, Chapter};

/// 书源目录
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureCatalog {
    /// 以 src_id 为键
    #[serde(default)]
    pub books: HashMap<String, FixtureBook>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureBook {
    #[serde(default)]
    pub detail: BookDetail,
    #[serde(default)]
    pub chapters: Vec<ChapterEntry>,
}

/// Fixture Source
pub struct FixtureSource {
    catalog: FixtureCatalog,
}

impl FixtureSource {
    pub fn new(catalog: FixtureCatalog) -> Self {
        Self { catalog }
    }

    /// 从 JSON 文件加载
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SourceError::NoData(format!("{}: {}", path.display(), e)))?;
        let catalog: FixtureCatalog = serde_json::from_str(&raw)
            .map_err(|e| SourceError::InvalidResponse(format!("{}: {}", path.display(), e)))?;

        tracing::info!(
            path = %path.display(),
            books = catalog.books.len(),
            "Fixture source loaded"
        );
        Ok(Self::new(catalog))
    }

    fn book(&self, book: &Book) -> Result<&FixtureBook, SourceError> {
        self.catalog
            .books
            .get(&book.src_id)
            .ok_or_else(|| SourceError::NoData(format!("unknown src_id {:?}", book.src_id)))
    }
}

#[async_trait]
impl SourcePort for FixtureSource {
    async fn get_book_detail(&self, book: &Book) -> Result<BookDetail, SourceError> {
        Ok(self.book(book)?.detail.clone())
    }

    async fn get_chapters(&self, book: &Book) -> Result<Vec<ChapterEntry>, SourceError> {
        let entries = self
            .book(book)?
            .chapters
            .iter()
            .map(|entry| ChapterEntry {
                content: String::new(),
                ..entry.clone()
            })
            .collect();
        Ok(entries)
    }

    async fn get_chapter_content(
        &self,
        book: &Book,
        chapter: &Chapter,
    ) -> Result<String, SourceError> {
        let entries = &self.book(book)?.chapters;
        let found = if chapter.src_url.is_empty() {
            let numbers = assign_numbers(entries)?;
            entries
                .iter()
                .zip(numbers)
                .find(|(_, number)| *number == chapter.number)
                .map(|(e, _)| e)
        } else {
            entries.iter().find(|e| e.src_url == chapter.src_url)
        };

        found
            .map(|entry| entry.content.clone())
            .ok_or_else(|| SourceError::NoData(format!("chapter {} not in fixture", chapter.number)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{BookId, ChapterId, NewBook, NewChapter};
    use chrono::Utc;
    use std::io::Write;

    const CATALOG: &str = r#"{
        "books": {
            "1001": {
                "detail": {"author": "辰东", "score": 9},
                "chapters": [
                    {"title": "第一章", "url": "/c/1", "content": "一"},
                    {"title": "第二章", "url": "/c/2", "content": "二"}
                ]
            }
        }
    }"#;

    fn book(src_id: &str) -> Book {
        NewBook::named("完美世界")
            .with_source("fixture", src_id, "")
            .into_book(BookId::new(1), Utc::now())
    }

    #[tokio::test]
    async fn test_fixture_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();
        let source = FixtureSource::from_path(file.path()).unwrap();

        let detail = source.get_book_detail(&book("1001")).await.unwrap();
        assert_eq!(detail.author, "辰东");

        let entries = source.get_chapters(&book("1001")).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.content.is_empty()));

        let chapter = NewChapter::new(BookId::new(1), 2)
            .with_src_url("/c/2")
            .into_chapter(ChapterId::new(2), Utc::now());
        let content = source
            .get_chapter_content(&book("1001"), &chapter)
            .await
            .unwrap();
        assert_eq!(content, "二");
    }

    #[tokio::test]
    async fn test_content_by_number_matches_listing_numbers() {
        let source = FixtureSource::new(
            serde_json::from_str(
                r#"{"books": {"1001": {"chapters": [
                    {"title": "序章", "content": "序"},
                    {"number": 1, "title": "第一章", "content": "一"}
                ]}}}"#,
            )
            .unwrap(),
        );

        // 序章缺省位置号 1 已被占用，顺延为 2
        for (number, expected) in [(1, "一"), (2, "序")] {
            let chapter =
                NewChapter::new(BookId::new(1), number).into_chapter(ChapterId::new(1), Utc::now());
            let content = source
                .get_chapter_content(&book("1001"), &chapter)
                .await
                .unwrap();
            assert_eq!(content, expected);
        }
    }

    #[tokio::test]
    async fn test_unknown_book_is_no_data() {
        let source = FixtureSource::new(serde_json::from_str(CATALOG).unwrap());
        let err = source.get_chapters(&book("404")).await.unwrap_err();
        assert!(matches!(err, SourceError::NoData(_)));
    }

    #[test]
    fn test_invalid_file_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not json").unwrap();
        assert!(matches!(
            FixtureSource::from_path(file.path()),
            Err(SourceError::InvalidResponse(_))
        ));
    }
}
