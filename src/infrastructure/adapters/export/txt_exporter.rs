//! Txt Exporter - 纯文本导出
//!
//! 实现 BookExportPort trait

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::application::ports::{BookExportPort, ExportError, ExportedChapter};

/// 规范化导出路径
///
/// 没有扩展名或扩展名不是 txt（不区分大小写）时追加 `.txt`
pub fn normalize_export_path(path: &Path) -> PathBuf {
    let is_txt = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"));

    if is_txt {
        path.to_path_buf()
    } else {
        let mut raw = path.as_os_str().to_os_string();
        raw.push(".txt");
        PathBuf::from(raw)
    }
}

/// 每章一行标题，随后是正文
pub fn render_book(chapters: &[ExportedChapter]) -> String {
    let capacity = chapters
        .iter()
        .map(|c| c.title.len() + c.content.len() + 3)
        .sum();
    let mut out = String::with_capacity(capacity);
    for chapter in chapters {
        out.push_str(&chapter.title);
        out.push('\n');
        out.push_str(&chapter.content);
        if !chapter.content.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

/// 纯文本导出器
#[derive(Debug, Clone, Default)]
pub struct TxtExporter;

impl TxtExporter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BookExportPort for TxtExporter {
    async fn export(
        &self,
        path: &Path,
        book_name: &str,
        chapters: &[ExportedChapter],
    ) -> Result<PathBuf, ExportError> {
        if path.as_os_str().is_empty() {
            return Err(ExportError::InvalidPath("empty path".to_string()));
        }

        let target = normalize_export_path(path);
        let text = render_book(chapters);

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ExportError::IoError(e.to_string()))?;
        }

        fs::write(&target, text.as_bytes())
            .await
            .map_err(|e| ExportError::IoError(e.to_string()))?;

        tracing::info!(
            book = %book_name,
            path = %target.display(),
            chapters = chapters.len(),
            bytes = text.len(),
            "Book exported"
        );

        Ok(target)
    }
}
