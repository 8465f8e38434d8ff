//! SQLite Book Repository

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{FromRow, QueryBuilder, Sqlite};

use super::database::{db_error, insert_error, parse_timestamp};
use super::DbPool;
use crate::application::ports::{BookFilter, BookRepositoryPort, RepositoryError};
use crate::domain::catalog::{Book, BookId, NewBook, ResolutionState, TagId};

const BOOK_COLUMNS: &str = "id, name, is_over, author, description, score, is_locked, \
     src_name, src_id, src_url, strategy_id, chapters_state, created_at, updated_at";

/// SQLite Book Repository
pub struct SqliteBookRepository {
    pool: DbPool,
}

impl SqliteBookRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct BookRow {
    id: i64,
    name: String,
    is_over: bool,
    author: String,
    description: String,
    score: i64,
    is_locked: bool,
    src_name: String,
    src_id: String,
    src_url: String,
    strategy_id: Option<i64>,
    chapters_state: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<BookRow> for Book {
    type Error = RepositoryError;

    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        Ok(Book {
            id: BookId::new(row.id),
            name: row.name,
            is_over: row.is_over,
            author: row.author,
            description: row.description,
            score: row.score,
            lock: row.is_locked,
            src_name: row.src_name,
            src_id: row.src_id,
            src_url: row.src_url,
            strategy_id: row.strategy_id,
            chapters_state: ResolutionState::from_str(&row.chapters_state).ok_or_else(|| {
                RepositoryError::SerializationError(format!(
                    "invalid chapters_state {:?}",
                    row.chapters_state
                ))
            })?,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

#[async_trait]
impl BookRepositoryPort for SqliteBookRepository {
    async fn insert(&self, book: &NewBook) -> Result<Book, RepositoryError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO books (name, is_over, author, description, score, is_locked,
                               src_name, src_id, src_url, strategy_id, chapters_state,
                               created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&book.name)
        .bind(book.is_over)
        .bind(&book.author)
        .bind(&book.description)
        .bind(book.score)
        .bind(book.lock)
        .bind(&book.src_name)
        .bind(&book.src_id)
        .bind(&book.src_url)
        .bind(book.strategy_id)
        .bind(ResolutionState::Unresolved.as_str())
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| insert_error(e, format!("book {:?}", book.name)))?;

        let id = BookId::new(result.last_insert_rowid());
        tracing::debug!(book_id = %id, name = %book.name, "Book inserted");
        Ok(book.clone().into_book(id, now))
    }

    async fn update(&self, book: &Book) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET name = ?, is_over = ?, author = ?, description = ?, score = ?, is_locked = ?,
                src_name = ?, src_id = ?, src_url = ?, strategy_id = ?, chapters_state = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&book.name)
        .bind(book.is_over)
        .bind(&book.author)
        .bind(&book.description)
        .bind(book.score)
        .bind(book.lock)
        .bind(&book.src_name)
        .bind(&book.src_id)
        .bind(&book.src_url)
        .bind(book.strategy_id)
        .bind(book.chapters_state.as_str())
        .bind(book.updated_at.to_rfc3339())
        .bind(book.id.value())
        .execute(&self.pool)
        .await
        .map_err(|e| insert_error(e, format!("book {:?}", book.name)))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("book {}", book.id)));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        let row: Option<BookRow> =
            sqlx::query_as(&format!("SELECT {} FROM books WHERE id = ?", BOOK_COLUMNS))
                .bind(id.value())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

        row.map(Book::try_from).transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Book>, RepositoryError> {
        let row: Option<BookRow> =
            sqlx::query_as(&format!("SELECT {} FROM books WHERE name = ?", BOOK_COLUMNS))
                .bind(name)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

        row.map(Book::try_from).transpose()
    }

    async fn find_one(&self, filter: &BookFilter) -> Result<Option<Book>, RepositoryError> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM books WHERE 1 = 1", BOOK_COLUMNS));

        if let Some(name) = &filter.name {
            query.push(" AND name = ").push_bind(name.clone());
        }
        if let Some(author) = &filter.author {
            query.push(" AND author = ").push_bind(author.clone());
        }
        if let Some(is_over) = filter.is_over {
            query.push(" AND is_over = ").push_bind(is_over);
        }
        if let Some(src_name) = &filter.src_name {
            query.push(" AND src_name = ").push_bind(src_name.clone());
        }
        if let Some(src_id) = &filter.src_id {
            query.push(" AND src_id = ").push_bind(src_id.clone());
        }
        if let Some(src_url) = &filter.src_url {
            query.push(" AND src_url = ").push_bind(src_url.clone());
        }
        // 多行命中时取 id 最小的一行
        query.push(" ORDER BY id LIMIT 1");

        let row: Option<BookRow> = query
            .build_query_as()
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.map(Book::try_from).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Book>, RepositoryError> {
        let rows: Vec<BookRow> =
            sqlx::query_as(&format!("SELECT {} FROM books ORDER BY id", BOOK_COLUMNS))
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)?;

        rows.into_iter().map(Book::try_from).collect()
    }

    async fn find_by_tag(&self, tag_id: TagId) -> Result<Vec<Book>, RepositoryError> {
        let rows: Vec<BookRow> = sqlx::query_as(&format!(
            "SELECT {} FROM books WHERE id IN (SELECT book_id FROM book_tag_ships WHERE tag_id = ?) ORDER BY id",
            BOOK_COLUMNS
        ))
        .bind(tag_id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(Book::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::sqlite::{create_pool, run_migrations, DatabaseConfig};

    async fn repo() -> SqliteBookRepository {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteBookRepository::new(pool)
    }

    #[tokio::test]
    async fn test_insert_and_find_by_name() {
        let repo = repo().await;
        let book = repo
            .insert(&NewBook::named("雪中悍刀行").with_score(5))
            .await
            .unwrap();

        let found = repo.find_by_name("雪中悍刀行").await.unwrap().unwrap();
        assert_eq!(found.id, book.id);
        assert_eq!(found.score, 5);
        assert_eq!(found.chapters_state, ResolutionState::Unresolved);
        assert!(repo.find_by_name("不存在").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_is_reported() {
        let repo = repo().await;
        repo.insert(&NewBook::named("重名")).await.unwrap();

        let err = repo.insert(&NewBook::named("重名")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_update_round_trips_fields() {
        let repo = repo().await;
        let mut book = repo.insert(&NewBook::named("诛仙")).await.unwrap();

        book.author = "萧鼎".to_string();
        book.lock = true;
        book.strategy_id = Some(3);
        book.set_chapters_state(ResolutionState::Empty);
        repo.update(&book).await.unwrap();

        let found = repo.find_by_id(book.id).await.unwrap().unwrap();
        assert_eq!(found.author, "萧鼎");
        assert!(found.lock);
        assert_eq!(found.strategy_id, Some(3));
        assert_eq!(found.chapters_state, ResolutionState::Empty);
    }

    #[tokio::test]
    async fn test_find_one_takes_smallest_id() {
        let repo = repo().await;
        let first = repo
            .insert(&NewBook::named("甲").with_source("qidian", "1", ""))
            .await
            .unwrap();
        repo.insert(&NewBook::named("乙").with_source("qidian", "2", ""))
            .await
            .unwrap();

        let filter = BookFilter {
            src_name: Some("qidian".to_string()),
            ..Default::default()
        };
        let found = repo.find_one(&filter).await.unwrap().unwrap();
        assert_eq!(found.id, first.id);

        let by_source = repo
            .find_one(&BookFilter::by_source("qidian", "2"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_source.name, "乙");

        let none = repo
            .find_one(&BookFilter::by_source("qidian", "3"))
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_update_missing_book_is_not_found() {
        let repo = repo().await;
        let ghost = NewBook::named("幽灵").into_book(BookId::new(999), Utc::now());
        assert!(matches!(
            repo.update(&ghost).await,
            Err(RepositoryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_corrupt_chapters_state_is_reported() {
        let repo = repo().await;
        let book = repo.insert(&NewBook::named("坏数据")).await.unwrap();
        sqlx::query("UPDATE books SET chapters_state = 'bogus' WHERE id = ?")
            .bind(book.id.value())
            .execute(&repo.pool)
            .await
            .unwrap();

        let err = repo.find_by_id(book.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::SerializationError(_)));
    }
}
