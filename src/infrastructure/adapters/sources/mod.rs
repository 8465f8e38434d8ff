//! Source Adapters - 书源实现

mod fixture_source;
mod http_json_source;
mod registry;

pub use fixture_source::{FixtureBook, FixtureCatalog, FixtureSource};
pub use http_json_source::{HttpJsonSource, HttpJsonSourceConfig};
pub use registry::build_source_factory;
