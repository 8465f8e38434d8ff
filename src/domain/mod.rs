//! Domain Layer - 领域层
//!
//! 限界上下文:
//! - Catalog Context: 书籍、章节、标签

pub mod catalog;
