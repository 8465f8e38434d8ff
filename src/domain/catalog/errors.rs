//! Catalog Context - Errors

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("书名不能为空")]
    EmptyBookName,

    #[error("书名过长: {0} 字符")]
    BookNameTooLong(usize),

    #[error("标签名不能为空")]
    EmptyTagName,

    #[error("无效的章节号: {0}")]
    InvalidChapterNumber(i32),
}
