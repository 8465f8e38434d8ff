//! SQLite Tag Repository

use async_trait::async_trait;
use sqlx::FromRow;

use super::database::{db_error, insert_error};
use super::DbPool;
use crate::application::ports::{RepositoryError, TagRepositoryPort};
use crate::domain::catalog::{BookId, BookTagShip, Tag, TagId};

/// SQLite Tag Repository
pub struct SqliteTagRepository {
    pool: DbPool,
}

impl SqliteTagRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct TagRow {
    id: i64,
    name: String,
}

impl From<TagRow> for Tag {
    fn from(row: TagRow) -> Self {
        Tag {
            id: TagId::new(row.id),
            name: row.name,
        }
    }
}

#[derive(FromRow)]
struct ShipRow {
    id: i64,
    book_id: i64,
    tag_id: i64,
}

impl From<ShipRow> for BookTagShip {
    fn from(row: ShipRow) -> Self {
        BookTagShip {
            id: row.id,
            book_id: BookId::new(row.book_id),
            tag_id: TagId::new(row.tag_id),
        }
    }
}

#[async_trait]
impl TagRepositoryPort for SqliteTagRepository {
    async fn insert(&self, name: &str) -> Result<Tag, RepositoryError> {
        let result = sqlx::query("INSERT INTO tags (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| insert_error(e, format!("tag {:?}", name)))?;

        Ok(Tag {
            id: TagId::new(result.last_insert_rowid()),
            name: name.to_string(),
        })
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Tag>, RepositoryError> {
        let row: Option<TagRow> = sqlx::query_as("SELECT id, name FROM tags WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(row.map(Tag::from))
    }

    async fn insert_ship(
        &self,
        book_id: BookId,
        tag_id: TagId,
    ) -> Result<BookTagShip, RepositoryError> {
        let result = sqlx::query("INSERT INTO book_tag_ships (book_id, tag_id) VALUES (?, ?)")
            .bind(book_id.value())
            .bind(tag_id.value())
            .execute(&self.pool)
            .await
            .map_err(|e| insert_error(e, format!("book {} tag {}", book_id, tag_id)))?;

        Ok(BookTagShip {
            id: result.last_insert_rowid(),
            book_id,
            tag_id,
        })
    }

    async fn find_ship(
        &self,
        book_id: BookId,
        tag_id: TagId,
    ) -> Result<Option<BookTagShip>, RepositoryError> {
        let row: Option<ShipRow> = sqlx::query_as(
            "SELECT id, book_id, tag_id FROM book_tag_ships WHERE book_id = ? AND tag_id = ?",
        )
        .bind(book_id.value())
        .bind(tag_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.map(BookTagShip::from))
    }

    async fn find_by_book(&self, book_id: BookId) -> Result<Vec<Tag>, RepositoryError> {
        let rows: Vec<TagRow> = sqlx::query_as(
            r#"
            SELECT t.id, t.name FROM tags t
            JOIN book_tag_ships s ON s.tag_id = t.id
            WHERE s.book_id = ?
            ORDER BY t.name
            "#,
        )
        .bind(book_id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows.into_iter().map(Tag::from).collect())
    }
}
