//! Source Factory - 书源注册表
//!
//! 启动时通过 builder 注册，之后只读；按 `Book::src_name` 查找适配器。

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::application::ports::SourcePort;

/// 书源名没有对应的适配器
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported source: {0:?}")]
pub struct UnsupportedSourceError(pub String);

/// 书源注册表
#[derive(Clone, Default)]
pub struct SourceFactory {
    sources: Arc<HashMap<String, Arc<dyn SourcePort>>>,
}

impl SourceFactory {
    pub fn builder() -> SourceFactoryBuilder {
        SourceFactoryBuilder::default()
    }

    /// 按名称获取书源适配器
    pub fn get_source(&self, name: &str) -> Result<Arc<dyn SourcePort>, UnsupportedSourceError> {
        self.sources
            .get(name)
            .cloned()
            .ok_or_else(|| UnsupportedSourceError(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    /// 已注册的书源名（排序后）
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sources.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl std::fmt::Debug for SourceFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceFactory")
            .field("sources", &self.names())
            .finish()
    }
}

/// SourceFactory 构建器
#[derive(Default)]
pub struct SourceFactoryBuilder {
    sources: HashMap<String, Arc<dyn SourcePort>>,
}

impl SourceFactoryBuilder {
    /// 注册书源，同名注册会覆盖之前的适配器
    pub fn register(mut self, name: impl Into<String>, source: Arc<dyn SourcePort>) -> Self {
        let name = name.into();
        if self.sources.insert(name.clone(), source).is_some() {
            tracing::warn!(source = %name, "Source registered twice, keeping the last one");
        } else {
            tracing::debug!(source = %name, "Source registered");
        }
        self
    }

    pub fn build(self) -> SourceFactory {
        SourceFactory {
            sources: Arc::new(self.sources),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{ChapterEntry, SourceError};
    use crate::domain::catalog::{Book, BookDetail, Chapter};
    use async_trait::async_trait;

    struct NullSource;

    #[async_trait]
    impl SourcePort for NullSource {
        async fn get_book_detail(&self, _book: &Book) -> Result<BookDetail, SourceError> {
            Ok(BookDetail::default())
        }

        async fn get_chapters(&self, _book: &Book) -> Result<Vec<ChapterEntry>, SourceError> {
            Ok(Vec::new())
        }

        async fn get_chapter_content(
            &self,
            _book: &Book,
            _chapter: &Chapter,
        ) -> Result<String, SourceError> {
            Ok(String::new())
        }
    }

    #[test]
    fn test_lookup_registered_source() {
        let factory = SourceFactory::builder()
            .register("qidian", Arc::new(NullSource))
            .register("biquge", Arc::new(NullSource))
            .build();

        assert!(factory.get_source("qidian").is_ok());
        assert_eq!(factory.names(), vec!["biquge", "qidian"]);
        assert_eq!(factory.len(), 2);
    }

    #[test]
    fn test_unknown_source_is_unsupported() {
        let factory = SourceFactory::builder()
            .register("qidian", Arc::new(NullSource))
            .build();

        let err = factory.get_source("nonexistent").err().unwrap();
        assert_eq!(err, UnsupportedSourceError("nonexistent".to_string()));
        assert!(SourceFactory::default().is_empty());
    }
}
