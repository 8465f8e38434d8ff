//! SQLite Persistence - SQLite 数据库持久化实现

mod book_repo;
mod chapter_repo;
mod database;
mod tag_repo;

pub use book_repo::*;
pub use chapter_repo::*;
pub use database::{create_pool, run_migrations, DatabaseConfig, DbPool};
pub use tag_repo::*;
