//! HTTP JSON Source - 通过 HTTP JSON 接口拉取书籍数据
//!
//! 实现 SourcePort trait
//!
//! 书源 API:
//! GET {base}/books/{src_id}            -> {"author": "...", "description": "...", "score": 0, "is_over": false}
//! GET {base}/books/{src_id}/chapters   -> [{"number": 1, "title": "...", "url": "..."}]
//! GET {chapter.src_url}                -> {"content": "..."}
//!
//! `src_id` 为空时改用 `book.src_url` 定位；相对 URL 以 base_url 为根。

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::application::ports::{ChapterEntry, SourceError, SourcePort};
use crate::domain::catalog::{Book, BookDetail, Chapter};

/// 章节正文响应体
#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    content: String,
}

/// HTTP 书源配置
#[derive(Debug, Clone)]
pub struct HttpJsonSourceConfig {
    /// 书源 API 基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// 网络错误 / 超时 / 5xx 的重试次数
    pub max_retries: u32,
    /// 重试退避基数（毫秒），第 n 次重试等待 n 倍
    pub retry_backoff_ms: u64,
}

impl Default for HttpJsonSourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: 30,
            max_retries: 2,
            retry_backoff_ms: 500,
        }
    }
}

impl HttpJsonSourceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// HTTP JSON 书源
pub struct HttpJsonSource {
    client: Client,
    config: HttpJsonSourceConfig,
}

impl HttpJsonSource {
    pub fn new(config: HttpJsonSourceConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SourceError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// 绝对 URL 原样返回，相对 URL 拼接到 base_url
    fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}/{}", self.base_url(), url.trim_start_matches('/'))
        }
    }

    fn book_url(&self, book: &Book) -> Result<String, SourceError> {
        if !book.src_id.is_empty() {
            Ok(format!("{}/books/{}", self.base_url(), book.src_id))
        } else if !book.src_url.is_empty() {
            Ok(self.resolve_url(&book.src_url))
        } else {
            Err(SourceError::MissingIdentifier(format!(
                "book {:?} has neither src_id nor src_url",
                book.name
            )))
        }
    }

    fn chapters_url(&self, book: &Book) -> Result<String, SourceError> {
        self.book_url(book).map(|url| format!("{}/chapters", url))
    }

    fn chapter_url(&self, chapter: &Chapter) -> Result<String, SourceError> {
        if chapter.src_url.is_empty() {
            return Err(SourceError::MissingIdentifier(format!(
                "chapter {} has no src_url",
                chapter.id
            )));
        }
        Ok(self.resolve_url(&chapter.src_url))
    }

    /// GET 并解析 JSON，可重试的错误按配置重试
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, SourceError> {
        let mut attempt = 0;
        loop {
            match self.get_json_once(url).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    tracing::warn!(url = %url, attempt, error = %e, "Source request failed, retrying");
                    let backoff = self.config.retry_backoff_ms * u64::from(attempt);
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_json_once<T: DeserializeOwned>(&self, url: &str) -> Result<T, SourceError> {
        tracing::debug!(url = %url, "Sending source request");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                SourceError::Timeout
            } else if e.is_connect() {
                SourceError::NetworkError(format!("Cannot connect to source: {}", e))
            } else {
                SourceError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SourceError::ServiceError {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SourceError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl SourcePort for HttpJsonSource {
    async fn get_book_detail(&self, book: &Book) -> Result<BookDetail, SourceError> {
        let url = self.book_url(book)?;
        self.get_json(&url).await
    }

    async fn get_chapters(&self, book: &Book) -> Result<Vec<ChapterEntry>, SourceError> {
        let url = self.chapters_url(book)?;
        let entries: Vec<ChapterEntry> = self.get_json(&url).await?;
        tracing::debug!(book = %book.name, count = entries.len(), "Chapter list fetched");
        Ok(entries)
    }

    async fn get_chapter_content(
        &self,
        _book: &Book,
        chapter: &Chapter,
    ) -> Result<String, SourceError> {
        let url = self.chapter_url(chapter)?;
        let response: ContentResponse = self.get_json(&url).await?;
        Ok(response.content)
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(format!("{}/health", self.base_url()))
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{BookId, ChapterId, NewBook, NewChapter};
    use chrono::Utc;

    fn source() -> HttpJsonSource {
        HttpJsonSource::new(HttpJsonSourceConfig::new("http://books.example.com/api/")).unwrap()
    }

    #[test]
    fn test_config_default() {
        let config = HttpJsonSourceConfig::default();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn test_config_builder() {
        let config = HttpJsonSourceConfig::new("http://example.com:9000")
            .with_timeout(60)
            .with_retries(0);
        assert_eq!(config.base_url, "http://example.com:9000");
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.max_retries, 0);
    }

    #[test]
    fn test_book_urls_prefer_src_id() {
        let source = source();
        let book = NewBook::named("x")
            .with_source("http", "42", "/ignored")
            .into_book(BookId::new(1), Utc::now());

        assert_eq!(
            source.book_url(&book).unwrap(),
            "http://books.example.com/api/books/42"
        );
        assert_eq!(
            source.chapters_url(&book).unwrap(),
            "http://books.example.com/api/books/42/chapters"
        );
    }

    #[test]
    fn test_book_url_falls_back_to_src_url() {
        let source = source();
        let relative = NewBook::named("x")
            .with_source("http", "", "/novels/abc")
            .into_book(BookId::new(1), Utc::now());
        assert_eq!(
            source.book_url(&relative).unwrap(),
            "http://books.example.com/api/novels/abc"
        );

        let missing = NewBook::named("y")
            .with_source("http", "", "")
            .into_book(BookId::new(2), Utc::now());
        assert!(matches!(
            source.book_url(&missing),
            Err(SourceError::MissingIdentifier(_))
        ));
    }

    #[test]
    fn test_chapter_url_keeps_absolute_urls() {
        let source = source();
        let chapter = NewChapter::new(BookId::new(1), 1)
            .with_src_url("https://mirror.example.com/c/1")
            .into_chapter(ChapterId::new(1), Utc::now());
        assert_eq!(
            source.chapter_url(&chapter).unwrap(),
            "https://mirror.example.com/c/1"
        );

        let bare = NewChapter::new(BookId::new(1), 2).into_chapter(ChapterId::new(2), Utc::now());
        assert!(source.chapter_url(&bare).is_err());
    }
}
