//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

use crate::application::LazyLoadingConfig;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 数据库配置
    #[serde(default)]
    pub database: DatabaseConfig,

    /// 懒加载开关
    #[serde(default)]
    pub lazy_loading: LazyLoadingConfig,

    /// 书源列表，`name` 与 `Book::src_name` 对应
    #[serde(default)]
    pub sources: Vec<SourceConfig>,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库文件路径
    #[serde(default = "default_db_path")]
    pub path: String,

    /// 最大连接数
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/webooks.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// 获取数据库 URL
    pub fn database_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path)
    }
}

/// 书源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// HTTP JSON 接口
    Http,
    /// 本地 JSON 文件
    Fixture,
}

/// 单个书源配置
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// 注册名
    pub name: String,

    pub kind: SourceKind,

    /// HTTP 书源的基础 URL
    #[serde(default)]
    pub url: Option<String>,

    /// Fixture 书源的文件路径
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// 请求超时时间（秒）
    #[serde(default = "default_source_timeout")]
    pub timeout_secs: u64,

    /// 最大重试次数
    #[serde(default = "default_source_retries")]
    pub max_retries: u32,
}

fn default_source_timeout() -> u64 {
    30
}

fn default_source_retries() -> u32 {
    2
}

impl SourceConfig {
    pub fn http(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SourceKind::Http,
            url: Some(url.into()),
            path: None,
            timeout_secs: default_source_timeout(),
            max_retries: default_source_retries(),
        }
    }

    pub fn fixture(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            kind: SourceKind::Fixture,
            url: None,
            path: Some(path.into()),
            timeout_secs: default_source_timeout(),
            max_retries: default_source_retries(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
