//! 按配置构建书源注册表

use std::sync::Arc;

use crate::application::ports::{SourceError, SourcePort};
use crate::application::sources::SourceFactory;
use crate::config::{SourceConfig, SourceKind};

use super::{FixtureSource, HttpJsonSource, HttpJsonSourceConfig};

/// 启动时一次性构建，之后只读
pub fn build_source_factory(configs: &[SourceConfig]) -> Result<SourceFactory, SourceError> {
    let mut builder = SourceFactory::builder();

    for config in configs {
        let source: Arc<dyn SourcePort> = match config.kind {
            SourceKind::Http => {
                let url = config.url.clone().unwrap_or_default();
                let http_config = HttpJsonSourceConfig::new(url)
                    .with_timeout(config.timeout_secs)
                    .with_retries(config.max_retries);
                Arc::new(HttpJsonSource::new(http_config)?)
            }
            SourceKind::Fixture => {
                let path = config.path.as_deref().ok_or_else(|| {
                    SourceError::MissingIdentifier(format!("fixture source {} has no path", config.name))
                })?;
                Arc::new(FixtureSource::from_path(path)?)
            }
        };
        builder = builder.register(config.name.clone(), source);
    }

    let factory = builder.build();
    tracing::info!(sources = ?factory.names(), "Source factory ready");
    Ok(factory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_build_from_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"books": {}}"#).unwrap();

        let factory = build_source_factory(&[
            SourceConfig::http("remote", "http://localhost:9000"),
            SourceConfig::fixture("local", file.path()),
        ])
        .unwrap();

        assert_eq!(factory.names(), vec!["local", "remote"]);
        assert!(factory.get_source("remote").is_ok());
        assert!(factory.get_source("missing").is_err());
    }

    #[test]
    fn test_missing_fixture_file_fails() {
        let result = build_source_factory(&[SourceConfig::fixture("local", "/no/such/file.json")]);
        assert!(result.is_err());
    }
}
