//! Webooks - 网络书籍目录与懒加载
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Catalog Context: 书籍、章节、标签
//!
//! 应用层 (application/):
//! - Ports: 端口定义（Repositories, Source, BookExport）
//! - Resolver: 基于自然键的 get-or-create
//! - Sources: 书源注册表
//! - Lazy Loading: 章节列表 / 正文的按需拉取与回填
//! - Commands / Queries: CQRS 处理器
//!
//! 基础设施层 (infrastructure/):
//! - Persistence: SQLite 存储
//! - Adapters: HTTP JSON 书源、Fixture 书源、TXT 导出

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
