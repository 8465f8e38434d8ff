//! SQLite Chapter Repository

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{FromRow, QueryBuilder, Sqlite};

use super::database::{db_error, insert_error, parse_timestamp};
use super::DbPool;
use crate::application::ports::{ChapterFilter, ChapterRepositoryPort, RepositoryError};
use crate::domain::catalog::{BookId, Chapter, ChapterId, NewChapter, ResolutionState};

const CHAPTER_COLUMNS: &str = "id, book_id, title, number, is_locked, content, src_url, \
     content_state, created_at, updated_at";

/// SQLite Chapter Repository
pub struct SqliteChapterRepository {
    pool: DbPool,
}

impl SqliteChapterRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ChapterRow {
    id: i64,
    book_id: i64,
    title: String,
    number: i32,
    is_locked: bool,
    content: String,
    src_url: String,
    content_state: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ChapterRow> for Chapter {
    type Error = RepositoryError;

    fn try_from(row: ChapterRow) -> Result<Self, Self::Error> {
        Ok(Chapter {
            id: ChapterId::new(row.id),
            book_id: BookId::new(row.book_id),
            title: row.title,
            number: row.number,
            lock: row.is_locked,
            content: row.content,
            src_url: row.src_url,
            content_state: ResolutionState::from_str(&row.content_state).ok_or_else(|| {
                RepositoryError::SerializationError(format!(
                    "invalid content_state {:?}",
                    row.content_state
                ))
            })?,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

#[async_trait]
impl ChapterRepositoryPort for SqliteChapterRepository {
    async fn insert(&self, chapter: &NewChapter) -> Result<Chapter, RepositoryError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO chapters (book_id, title, number, is_locked, content, src_url,
                                  content_state, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(chapter.book_id.value())
        .bind(&chapter.title)
        .bind(chapter.number)
        .bind(chapter.lock)
        .bind(&chapter.content)
        .bind(&chapter.src_url)
        .bind(chapter.initial_content_state().as_str())
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            insert_error(
                e,
                format!("chapter {} of book {}", chapter.number, chapter.book_id),
            )
        })?;

        let id = ChapterId::new(result.last_insert_rowid());
        Ok(chapter.clone().into_chapter(id, now))
    }

    async fn update(&self, chapter: &Chapter) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE chapters
            SET title = ?, number = ?, is_locked = ?, content = ?, src_url = ?,
                content_state = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&chapter.title)
        .bind(chapter.number)
        .bind(chapter.lock)
        .bind(&chapter.content)
        .bind(&chapter.src_url)
        .bind(chapter.content_state.as_str())
        .bind(chapter.updated_at.to_rfc3339())
        .bind(chapter.id.value())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            insert_error(
                e,
                format!("chapter {} of book {}", chapter.number, chapter.book_id),
            )
        })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("chapter {}", chapter.id)));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: ChapterId) -> Result<Option<Chapter>, RepositoryError> {
        let row: Option<ChapterRow> = sqlx::query_as(&format!(
            "SELECT {} FROM chapters WHERE id = ?",
            CHAPTER_COLUMNS
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(Chapter::try_from).transpose()
    }

    async fn find_one(&self, filter: &ChapterFilter) -> Result<Option<Chapter>, RepositoryError> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM chapters WHERE 1 = 1",
            CHAPTER_COLUMNS
        ));

        if let Some(book_id) = filter.book_id {
            query.push(" AND book_id = ").push_bind(book_id.value());
        }
        if let Some(number) = filter.number {
            query.push(" AND number = ").push_bind(number);
        }
        if let Some(title) = &filter.title {
            query.push(" AND title = ").push_bind(title.clone());
        }
        if let Some(src_url) = &filter.src_url {
            query.push(" AND src_url = ").push_bind(src_url.clone());
        }
        // 多行命中时取 id 最小的一行
        query.push(" ORDER BY id LIMIT 1");

        let row: Option<ChapterRow> = query
            .build_query_as()
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.map(Chapter::try_from).transpose()
    }

    async fn find_by_book(&self, book_id: BookId) -> Result<Vec<Chapter>, RepositoryError> {
        let rows: Vec<ChapterRow> = sqlx::query_as(&format!(
            "SELECT {} FROM chapters WHERE book_id = ? ORDER BY number, id",
            CHAPTER_COLUMNS
        ))
        .bind(book_id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(Chapter::try_from).collect()
    }

    async fn upsert_listing(
        &self,
        book_id: BookId,
        chapters: &[NewChapter],
    ) -> Result<Vec<Chapter>, RepositoryError> {
        if !chapters.is_empty() {
            let now = Utc::now().to_rfc3339();
            let mut tx = self.pool.begin().await.map_err(db_error)?;

            for chapter in chapters {
                // 目录里的空正文不覆盖已有正文
                sqlx::query(
                    r#"
                    INSERT INTO chapters (book_id, title, number, is_locked, content, src_url,
                                          content_state, created_at, updated_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                    ON CONFLICT(book_id, number) DO UPDATE SET
                        title = excluded.title,
                        src_url = excluded.src_url,
                        content = CASE WHEN excluded.content <> ''
                                       THEN excluded.content ELSE chapters.content END,
                        content_state = CASE WHEN excluded.content <> ''
                                             THEN excluded.content_state ELSE chapters.content_state END,
                        updated_at = excluded.updated_at
                    "#,
                )
                .bind(book_id.value())
                .bind(&chapter.title)
                .bind(chapter.number)
                .bind(chapter.lock)
                .bind(&chapter.content)
                .bind(&chapter.src_url)
                .bind(chapter.initial_content_state().as_str())
                .bind(&now)
                .bind(&now)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
            }

            tx.commit().await.map_err(db_error)?;
            tracing::debug!(book_id = %book_id, count = chapters.len(), "Chapter listing upserted");
        }

        self.find_by_book(book_id).await
    }
}
