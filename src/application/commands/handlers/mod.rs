//! Command Handlers 实现
//!
//! 所有 CommandHandler 的具体实现

mod catalog_handlers;

pub use catalog_handlers::*;
