//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod export;
pub mod sources;

pub use export::*;
pub use sources::*;
