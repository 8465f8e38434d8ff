//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, SourceKind};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `WEBOOKS_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `WEBOOKS_DATABASE__PATH=/data/webooks.db`
/// - `WEBOOKS_LAZY_LOADING__CONTENT=false`
/// - `WEBOOKS_LOG__JSON=true`
///
/// 书源列表只能写在配置文件里（`[[sources]]`）
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值
    builder = builder
        .set_default("database.path", "data/webooks.db")?
        .set_default("database.max_connections", 5)?
        .set_default("lazy_loading.chapters", true)?
        .set_default("lazy_loading.content", true)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量，例如 WEBOOKS_LAZY_LOADING__CHAPTERS=false
    builder = builder.add_source(
        Environment::with_prefix("WEBOOKS")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.database.path.is_empty() {
        return Err(ConfigError::ValidationError(
            "Database path cannot be empty".to_string(),
        ));
    }

    if config.database.max_connections == 0 {
        return Err(ConfigError::ValidationError(
            "Database max_connections cannot be 0".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for source in &config.sources {
        if source.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Source name cannot be empty".to_string(),
            ));
        }
        if !names.insert(source.name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Duplicate source name: {}",
                source.name
            )));
        }
        match source.kind {
            SourceKind::Http if source.url.as_deref().map_or(true, str::is_empty) => {
                return Err(ConfigError::ValidationError(format!(
                    "Source {} requires a url",
                    source.name
                )));
            }
            SourceKind::Fixture if source.path.is_none() => {
                return Err(ConfigError::ValidationError(format!(
                    "Source {} requires a path",
                    source.name
                )));
            }
            _ => {}
        }
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Database: {}", config.database.path);
    tracing::info!("Database Max Connections: {}", config.database.max_connections);
    tracing::info!("Lazy Loading Chapters: {}", config.lazy_loading.chapters);
    tracing::info!("Lazy Loading Content: {}", config.lazy_loading.content);
    for source in &config.sources {
        match source.kind {
            SourceKind::Http => tracing::info!(
                "Source {}: http {} (timeout {}s, retries {})",
                source.name,
                source.url.as_deref().unwrap_or_default(),
                source.timeout_secs,
                source.max_retries
            ),
            SourceKind::Fixture => tracing::info!(
                "Source {}: fixture {:?}",
                source.name,
                source.path.as_deref().unwrap_or(Path::new(""))
            ),
        }
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;
    use std::io::Write;

    #[test]
    fn test_validation_passes_for_valid_config() {
        let mut config = AppConfig::default();
        config.sources = vec![
            SourceConfig::http("remote", "http://localhost:9000"),
            SourceConfig::fixture("local", "fixtures/books.json"),
        ];
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_empty_db_path() {
        let mut config = AppConfig::default();
        config.database.path = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_connections() {
        let mut config = AppConfig::default();
        config.database.max_connections = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_duplicate_source() {
        let mut config = AppConfig::default();
        config.sources = vec![
            SourceConfig::http("remote", "http://a"),
            SourceConfig::http("remote", "http://b"),
        ];
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_incomplete_source() {
        let mut config = AppConfig::default();
        let mut http = SourceConfig::http("remote", "");
        config.sources = vec![http.clone()];
        assert!(validate_config(&config).is_err());

        http.url = None;
        config.sources = vec![http];
        assert!(validate_config(&config).is_err());

        let mut fixture = SourceConfig::fixture("local", "x.json");
        fixture.path = None;
        config.sources = vec![fixture];
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[database]
path = "books.db"

[lazy_loading]
content = false

[[sources]]
name = "local"
kind = "fixture"
path = "fixtures/books.json"
"#
        )
        .unwrap();

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.database.path, "books.db");
        assert_eq!(config.database.max_connections, 5);
        assert!(config.lazy_loading.chapters);
        assert!(!config.lazy_loading.content);
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].kind, SourceKind::Fixture);
    }
}
