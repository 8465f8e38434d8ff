//! 应用层错误定义
//!
//! - `LazyLoadError`: 懒加载编排的失败
//! - `ApplicationError`: 统一的命令/查询错误类型

use thiserror::Error;

use crate::application::ports::{ExportError, RepositoryError, SourceError};
use crate::application::sources::UnsupportedSourceError;
use crate::domain::catalog::CatalogError;

/// 懒加载错误
///
/// 任何一种失败都不会把字段标记为已解析，下次访问会重新尝试。
#[derive(Debug, Error)]
pub enum LazyLoadError {
    /// `src_name` 未注册，尝试前即失败，字段保持不变
    #[error(transparent)]
    UnsupportedSource(#[from] UnsupportedSourceError),

    /// 书源拉取失败（网络、解析、无数据）
    #[error("Source {source_name:?} failed: {error}")]
    Fetch {
        source_name: String,
        #[source]
        error: SourceError,
    },

    /// 显式刷新被 `lock` 标记拒绝
    #[error("{entity} {id} is locked")]
    Locked { entity: &'static str, id: i64 },

    /// 存储错误原样向上传递
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl LazyLoadError {
    pub fn fetch(source_name: impl Into<String>, error: SourceError) -> Self {
        Self::Fetch {
            source_name: source_name.into(),
            error,
        }
    }

    /// 调用方稍后重试是否可能成功
    pub fn is_retryable(&self) -> bool {
        match self {
            LazyLoadError::Fetch { error, .. } => error.is_retryable(),
            _ => false,
        }
    }
}

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {key}")]
    NotFound {
        resource_type: &'static str,
        key: String,
    },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 懒加载失败
    #[error(transparent)]
    LazyLoading(#[from] LazyLoadError),

    /// 仓储错误
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),

    /// 文件存储错误
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, key: impl std::fmt::Display) -> Self {
        Self::NotFound {
            resource_type,
            key: key.to_string(),
        }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }
}

impl From<CatalogError> for ApplicationError {
    fn from(err: CatalogError) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<ExportError> for ApplicationError {
    fn from(err: ExportError) -> Self {
        Self::StorageError(err.to_string())
    }
}
