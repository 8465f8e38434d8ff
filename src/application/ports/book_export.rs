//! Book Export Port - 出站端口
//!
//! 把整本书导出到调用方指定的路径

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 导出错误
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Invalid export path: {0}")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// 待导出的一章（正文已通过懒加载读取）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedChapter {
    pub number: i32,
    pub title: String,
    pub content: String,
}

/// Book Export Port
#[async_trait]
pub trait BookExportPort: Send + Sync {
    /// 按给定顺序写出章节，返回实际写入的路径
    ///
    /// 写入是一次性的：失败时不会留下半截文件
    async fn export(
        &self,
        path: &Path,
        book_name: &str,
        chapters: &[ExportedChapter],
    ) -> Result<PathBuf, ExportError>;
}
